//! Client domain types.

use serde::{Deserialize, Serialize};

/// Peruvian identity document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// National ID for individuals, 8 digits.
    Dni,
    /// Taxpayer registry for businesses, 11 digits.
    Ruc,
}

impl DocumentType {
    /// Number of digits the document must have.
    #[must_use]
    pub const fn digits(self) -> usize {
        match self {
            Self::Dni => 8,
            Self::Ruc => 11,
        }
    }

    /// Uppercase name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dni => "DNI",
            Self::Ruc => "RUC",
        }
    }

    /// Lowercase name used in storage and paths.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dni => "dni",
            Self::Ruc => "ruc",
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dni" => Ok(Self::Dni),
            "ruc" => Ok(Self::Ruc),
            _ => Err(format!("Unknown document type: {s}")),
        }
    }
}

/// Tax receipt issued for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptKind {
    /// Consumer receipt.
    Boleta,
    /// Invoice for RUC holders.
    Factura,
}

impl ReceiptKind {
    /// Receipt kind for a client document: factura for 11-digit numbers.
    #[must_use]
    pub fn for_document(document_number: &str) -> Self {
        if document_number.len() == DocumentType::Ruc.digits() {
            Self::Factura
        } else {
            Self::Boleta
        }
    }

    /// Series printed on the receipt.
    #[must_use]
    pub const fn series(self) -> &'static str {
        match self {
            Self::Boleta => "B001",
            Self::Factura => "F001",
        }
    }

    /// Lowercase name used in storage and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boleta => "boleta",
            Self::Factura => "factura",
        }
    }
}

/// Client fields as submitted for registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    /// Document type.
    pub document_type: DocumentType,
    /// Document number.
    pub document_number: String,
    /// Full name or business name.
    pub full_name: String,
    /// Street address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: Option<String>,
}
