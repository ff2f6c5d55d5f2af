//! Request payload validation
//!
//! Turns `validator` errors into a `ValidationFailed` [`AppError`] whose
//! details map each offending field path to its messages.

use serde_json::Value;
use shared::AppError;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Validate a request payload
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(|errors| {
        let mut fields = Vec::new();
        collect(&errors, "", &mut fields);
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let summary = fields
            .iter()
            .map(|(field, _)| field.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        fields.into_iter().fold(
            AppError::validation(format!("Invalid fields: {summary}")),
            |err, (field, messages)| err.with_detail(field, Value::from(messages)),
        )
    })
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("failed '{}' check", error.code),
    }
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, Vec<String>)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.push((path, errs.iter().map(describe).collect()));
            }
            ValidationErrorsKind::Struct(nested) => collect(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect(nested, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use shared::models::{OrderCreate, OrderItemCreate, PaymentMethod, ShippingAddress};
    use shared::models::LoginRequest;

    #[test]
    fn test_flat_fields() {
        let req = LoginRequest {
            email: "nope".into(),
            password: String::new(),
        };
        let err = validate_payload(&req).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert!(details.contains_key("email"));
        assert!(details.contains_key("password"));
        assert_eq!(err.message, "Invalid fields: email, password");
    }

    #[test]
    fn test_nested_paths() {
        let req = OrderCreate {
            customer_name: "Ana Lucia".into(),
            customer_email: "ana@example.com".into(),
            customer_phone: "3001234567".into(),
            payment_method: PaymentMethod::ContraEntrega,
            shipping_address: ShippingAddress {
                street: String::new(),
                number: "1".into(),
                city: "Cali".into(),
                department: String::new(),
                zip_code: String::new(),
                details: String::new(),
            },
            items: vec![
                OrderItemCreate {
                    product_id: "p1".into(),
                    quantity: 1,
                },
                OrderItemCreate {
                    product_id: "p2".into(),
                    quantity: 0,
                },
            ],
            discount_code: None,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
        };
        let details = validate_payload(&req).unwrap_err().details.unwrap();
        assert!(details.contains_key("shipping_address.street"));
        assert!(details.contains_key("items[1].quantity"));
        assert!(!details.contains_key("items[0].quantity"));
    }

    #[test]
    fn test_valid_payload_passes() {
        let req = LoginRequest {
            email: "ana@example.com".into(),
            password: "secret".into(),
        };
        assert!(validate_payload(&req).is_ok());
    }
}
