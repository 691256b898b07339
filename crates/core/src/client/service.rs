//! Client validation and normalization.

use super::error::ClientError;
use super::types::{ClientDraft, DocumentType};

/// Client service for business logic.
pub struct ClientService;

impl ClientService {
    /// Checks that a document number has exactly the digits its type requires.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidDocument` otherwise.
    pub fn validate_document(
        document_type: DocumentType,
        document_number: &str,
    ) -> Result<(), ClientError> {
        let expected = document_type.digits();
        if document_number.len() != expected
            || !document_number.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ClientError::InvalidDocument {
                kind: document_type.label(),
                expected,
            });
        }
        Ok(())
    }

    /// Trims, collapses inner whitespace, and upper-cases a name.
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase()
    }

    /// Name used when the ID lookup cannot resolve a document.
    #[must_use]
    pub fn placeholder_name(document_type: DocumentType, document_number: &str) -> String {
        let name = match document_type {
            DocumentType::Dni => format!("Cliente DNI {document_number} (Manual)"),
            DocumentType::Ruc => format!("Empresa RUC {document_number} (Manual)"),
        };
        Self::normalize_name(&name)
    }

    /// Validates and normalizes a registration.
    ///
    /// # Errors
    ///
    /// Returns a `ClientError` for a bad document, an empty required field,
    /// or a malformed email.
    pub fn prepare(draft: ClientDraft) -> Result<ClientDraft, ClientError> {
        let document_number = draft.document_number.trim().to_string();
        Self::validate_document(draft.document_type, &document_number)?;

        let full_name = Self::normalize_name(&draft.full_name);
        if full_name.is_empty() {
            return Err(ClientError::MissingField("full_name"));
        }
        let address = draft.address.trim().to_string();
        if address.is_empty() {
            return Err(ClientError::MissingField("address"));
        }
        let phone = draft.phone.trim().to_string();
        if phone.is_empty() {
            return Err(ClientError::MissingField("phone"));
        }

        let email = match draft.email.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(e) if e.contains('@') => Some(e.to_lowercase()),
            Some(_) => return Err(ClientError::InvalidEmail),
        };

        Ok(ClientDraft {
            document_type: draft.document_type,
            document_number,
            full_name,
            address,
            phone,
            email,
        })
    }

    /// Whether an email can receive payment-gateway notifications.
    ///
    /// Rejects addresses without '@' and the demo addresses used as form
    /// defaults ("example", "cliente@").
    #[must_use]
    pub fn is_deliverable_email(email: &str) -> bool {
        let email = email.trim().to_lowercase();
        email.contains('@') && !email.contains("example") && !email.contains("cliente@")
    }

    /// Returns the email if it is deliverable.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::UndeliverableEmail` for a missing or demo address.
    pub fn require_deliverable_email(email: Option<&str>) -> Result<String, ClientError> {
        match email {
            Some(e) if Self::is_deliverable_email(e) => Ok(e.trim().to_string()),
            _ => Err(ClientError::UndeliverableEmail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReceiptKind;

    fn draft() -> ClientDraft {
        ClientDraft {
            document_type: DocumentType::Dni,
            document_number: " 12345678 ".into(),
            full_name: "  juan   perez ".into(),
            address: "Av. Lima 123".into(),
            phone: "999888777".into(),
            email: Some("Juan@Mail.pe".into()),
        }
    }

    #[test]
    fn test_document_lengths() {
        assert!(ClientService::validate_document(DocumentType::Dni, "12345678").is_ok());
        assert!(ClientService::validate_document(DocumentType::Ruc, "20123456789").is_ok());
        assert_eq!(
            ClientService::validate_document(DocumentType::Dni, "1234567"),
            Err(ClientError::InvalidDocument {
                kind: "DNI",
                expected: 8
            })
        );
        assert!(ClientService::validate_document(DocumentType::Ruc, "2012345678A").is_err());
        assert!(ClientService::validate_document(DocumentType::Ruc, "12345678").is_err());
    }

    #[test]
    fn test_prepare_normalizes() {
        let prepared = ClientService::prepare(draft()).unwrap();
        assert_eq!(prepared.document_number, "12345678");
        assert_eq!(prepared.full_name, "JUAN PEREZ");
        assert_eq!(prepared.email.as_deref(), Some("juan@mail.pe"));
    }

    #[test]
    fn test_prepare_requires_fields() {
        let mut missing_phone = draft();
        missing_phone.phone = "   ".into();
        assert_eq!(
            ClientService::prepare(missing_phone),
            Err(ClientError::MissingField("phone"))
        );

        let mut blank_email = draft();
        blank_email.email = Some(String::new());
        assert_eq!(ClientService::prepare(blank_email).unwrap().email, None);

        let mut bad_email = draft();
        bad_email.email = Some("not-an-email".into());
        assert_eq!(ClientService::prepare(bad_email), Err(ClientError::InvalidEmail));
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(
            ClientService::placeholder_name(DocumentType::Dni, "12345678"),
            "CLIENTE DNI 12345678 (MANUAL)"
        );
        assert_eq!(
            ClientService::placeholder_name(DocumentType::Ruc, "20123456789"),
            "EMPRESA RUC 20123456789 (MANUAL)"
        );
    }

    #[test]
    fn test_deliverable_email() {
        assert!(ClientService::is_deliverable_email("ana@gmail.com"));
        assert!(!ClientService::is_deliverable_email("ana.gmail.com"));
        assert!(!ClientService::is_deliverable_email("test@example.com"));
        assert!(!ClientService::is_deliverable_email("cliente@tienda.pe"));
        assert!(ClientService::require_deliverable_email(None).is_err());
    }

    #[test]
    fn test_receipt_series_follow_document_length() {
        assert_eq!(ReceiptKind::for_document("20123456789"), ReceiptKind::Factura);
        assert_eq!(ReceiptKind::for_document("20123456789").series(), "F001");
        assert_eq!(ReceiptKind::for_document("12345678"), ReceiptKind::Boleta);
        assert_eq!(ReceiptKind::for_document("12345678").series(), "B001");
    }
}
