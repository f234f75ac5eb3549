//! Delivery receipts

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult, DeliveryFailure, MultiError},
        redact::Redact,
    },
};

use super::{envelope_from_value, envelope_to_value, OpenMessageHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// Inbound message accepted by the platform
    Published,
    /// Outbound message handed to the integration
    Delivered,
    Sent,
    Read,
    Failed,
    Removed,
}

/// Why a message could not be delivered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReason {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl StatusReason {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn failure(&self) -> DeliveryFailure {
        DeliveryFailure::from_code(self.code.as_deref().unwrap_or_default())
    }

    pub fn as_error(&self) -> CodecError {
        CodecError::Delivery {
            kind: self.failure(),
            message: self.message.clone(),
        }
    }
}

/// Status of a message sent earlier, identified by the header id
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMessageReceipt {
    pub header: OpenMessageHeader,
    pub status: ReceiptStatus,
    pub reasons: Vec<StatusReason>,
    /// Set on the last receipt about this message
    pub is_final_receipt: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiptWire {
    #[serde(flatten)]
    header: OpenMessageHeader,
    status: ReceiptStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reasons: Vec<StatusReason>,
    #[serde(default)]
    is_final_receipt: bool,
}

impl OpenMessageReceipt {
    pub fn is_failed(&self) -> bool {
        self.status == ReceiptStatus::Failed
    }

    /// The delivery failures of a failed receipt
    ///
    /// A single reason gives its delivery error, several reasons are
    /// reported together. A failed receipt without reasons is a general
    /// error.
    pub fn as_error(&self) -> Option<CodecError> {
        if !self.is_failed() {
            return None;
        }
        match self.reasons.as_slice() {
            [] => Some(CodecError::Delivery {
                kind: DeliveryFailure::GeneralError,
                message: String::new(),
            }),
            [reason] => Some(reason.as_error()),
            reasons => {
                let mut merr = MultiError::new();
                for reason in reasons {
                    merr.push(reason.as_error());
                }
                merr.into_error()
            }
        }
    }

    pub(crate) fn encode(&self) -> CodecResult<Value> {
        let wire = ReceiptWire {
            header: self.header.clone(),
            status: self.status,
            reasons: self.reasons.clone(),
            is_final_receipt: self.is_final_receipt,
        };
        envelope_to_value("Receipt", &wire)
    }

    pub(crate) fn decode(value: Value) -> CodecResult<Self> {
        let wire: ReceiptWire = envelope_from_value(value)?;
        Ok(Self {
            header: wire.header,
            status: wire.status,
            reasons: wire.reasons,
            is_final_receipt: wire.is_final_receipt,
        })
    }
}

impl Redact for OpenMessageReceipt {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            header: self.header.redact_with(config),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        codec::{Decode, Encode},
        openmessaging::OpenMessage,
    };

    use super::*;

    fn receipt(status: &str, reasons: Value) -> Value {
        json!({
            "type": "Receipt",
            "id": "gmAy9zNkhf4ermFvHH9mB5",
            "channel": {
                "id": "bf5cf8fd-2b1b-4e2d-a5d4-24a9c16d1e3e",
                "platform": "Open",
                "type": "Private",
                "to": {"id": "abcdef12345"},
                "from": {"id": "edce4efa-4abf-468b-ada7-cd6d35e7bbaf"},
                "time": "2021-04-09T04:43:33.705Z",
                "messageId": "gmAy9zNkhf4ermFvHH9mB5"
            },
            "direction": "Outbound",
            "status": status,
            "reasons": reasons,
            "isFinalReceipt": true
        })
    }

    #[test]
    fn test_delivered_receipt() {
        let message = OpenMessage::from_value(receipt("Delivered", json!([]))).unwrap();
        let OpenMessage::Receipt(receipt) = &message else {
            panic!("unexpected message: {message:?}");
        };
        assert!(!receipt.is_failed());
        assert!(receipt.is_final_receipt);
        assert!(receipt.as_error().is_none());
        assert_eq!(
            message.to_value().unwrap()["channel"]["id"],
            "bf5cf8fd-2b1b-4e2d-a5d4-24a9c16d1e3e"
        );
    }

    #[test]
    fn test_failed_receipt_reasons() {
        let reasons = json!([
            {"code": "RateLimited", "message": "Too many messages"},
            {"code": "SomethingElse", "message": "Unexpected"}
        ]);
        let message = OpenMessage::from_value(receipt("Failed", reasons)).unwrap();
        let OpenMessage::Receipt(receipt) = message else {
            panic!("expected a receipt");
        };
        assert!(receipt.is_failed());
        assert_eq!(receipt.reasons[0].failure(), DeliveryFailure::RateLimited);
        assert_eq!(receipt.reasons[1].failure(), DeliveryFailure::GeneralError);

        let err = receipt.as_error().unwrap();
        assert!(err.any(&|err| matches!(
            err,
            CodecError::Delivery { kind: DeliveryFailure::RateLimited, .. }
        )));
        assert!(err.any(&|err| matches!(
            err,
            CodecError::Delivery { kind: DeliveryFailure::GeneralError, .. }
        )));
        assert_eq!(
            StatusReason::new("MessageExpired", "expired").as_error().to_string(),
            "message.expired: expired"
        );
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = OpenMessage::from_value(receipt("Lost", json!([]))).unwrap_err();
        assert!(err.is_json_unmarshal());
    }
}
