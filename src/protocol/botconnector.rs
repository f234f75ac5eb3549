//! Bot Connector envelopes
//!
//! The platform sends an [`IncomingMessageRequest`] for every customer turn
//! and expects an [`IncomingMessageResponse`]. A bot that answers
//! asynchronously posts an [`OutgoingMessageRequest`] and receives an
//! [`OutgoingMessageResponse`]. Every envelope is validated on decode and
//! refused on encode when invalid.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    codec::{serde_via_codec, Decode, Encode},
    config::CodecConfig,
};

use super::{
    error::{CodecError, CodecResult, MultiError},
    message::{MessageType, NormalizedMessage},
    redact::Redact,
    slot::SlotEntity,
};

/// Error reported by a bot in a failed turn
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error_code}: {error_message}")]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub error_message: String,
}

impl ErrorInfo {
    pub fn new(error_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            error_message: error_message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    Complete,
    Failed,
    MoreData,
}

impl BotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotState::Complete => "Complete",
            BotState::Failed => "Failed",
            BotState::MoreData => "MoreData",
        }
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotState {
    type Err = CodecError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Complete" => Ok(BotState::Complete),
            "Failed" => Ok(BotState::Failed),
            "MoreData" => Ok(BotState::MoreData),
            "" => Err(CodecError::missing("botState")),
            other => Err(CodecError::invalid(
                "botState",
                other,
                "Complete, Failed, MoreData",
            )),
        }
    }
}

/// A wire confidence of 0 means the bot did not report one
mod confidence {
    use serde::{Deserialize, Deserializer, Serializer};

    /// Zero is omitted like a missing value so it decodes back the same way
    pub fn is_absent(value: &Option<f64>) -> bool {
        value.map_or(true, |confidence| confidence == 0.0)
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(confidence) => serializer.serialize_f64(*confidence),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.filter(|confidence| *confidence != 0.0))
    }
}

fn required_uuid(merr: &mut MultiError, field: &str, id: &Uuid) {
    if id.is_nil() {
        merr.push(CodecError::missing(field));
    }
}

fn required_text(merr: &mut MultiError, field: &str, text: &str) {
    if text.is_empty() {
        merr.push(CodecError::missing(field));
    }
}

/// A customer turn forwarded to the bot
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessageRequest {
    pub bot_id: String,
    pub bot_version: String,
    pub bot_session_id: Uuid,
    pub conversation_id: Uuid,
    pub message_id: Uuid,
    pub language_code: String,
    /// Session timeout as sent by the platform, must be positive
    pub bot_session_timeout: i64,
    pub input_message: NormalizedMessage,
    pub parameters: BTreeMap<String, String>,
    pub correlation_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomingMessageRequestWire {
    #[serde(default)]
    bot_id: String,
    #[serde(default)]
    bot_version: String,
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    bot_session_id: Option<Uuid>,
    #[serde(
        rename = "genesysConversationId",
        default,
        with = "crate::protocol::scalar::uuid_opt"
    )]
    conversation_id: Option<Uuid>,
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    message_id: Option<Uuid>,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    bot_session_timeout: i64,
    #[serde(default)]
    input_message: Option<Value>,
    #[serde(default)]
    parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl IncomingMessageRequest {
    pub fn validate(&self) -> CodecResult<()> {
        let mut merr = MultiError::new();
        required_text(&mut merr, "botId", &self.bot_id);
        required_uuid(&mut merr, "botSessionId", &self.bot_session_id);
        required_uuid(&mut merr, "genesysConversationId", &self.conversation_id);
        required_uuid(&mut merr, "messageId", &self.message_id);
        required_text(&mut merr, "languageCode", &self.language_code);
        if self.bot_session_timeout <= 0 {
            merr.push(CodecError::invalid(
                "botSessionTimeout",
                self.bot_session_timeout,
                "must be greater than 0",
            ));
        }
        if self.input_message.message_type == MessageType::Structured {
            if let Some(content) = self
                .input_message
                .content
                .iter()
                .find(|content| content.as_button_response().is_none())
            {
                merr.push(CodecError::invalid(
                    "inputMessage.content",
                    content.content_type(),
                    "ButtonResponse",
                ));
            }
        }
        merr.into_result()
    }
}

impl Encode for IncomingMessageRequest {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let wire = IncomingMessageRequestWire {
            bot_id: self.bot_id.clone(),
            bot_version: self.bot_version.clone(),
            bot_session_id: Some(self.bot_session_id),
            conversation_id: Some(self.conversation_id),
            message_id: Some(self.message_id),
            language_code: self.language_code.clone(),
            bot_session_timeout: self.bot_session_timeout,
            input_message: Some(self.input_message.to_value()?),
            parameters: self.parameters.clone(),
            correlation_id: self.correlation_id.clone(),
        };
        serde_json::to_value(wire).map_err(CodecError::marshal)
    }
}

impl Decode for IncomingMessageRequest {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: IncomingMessageRequestWire =
            serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        let input_message = match wire.input_message {
            Some(Value::Null) | None => {
                return Err(CodecError::unmarshal(CodecError::missing("inputMessage.type")))
            }
            Some(message) => NormalizedMessage::from_value_with(message, config)?,
        };
        let request = Self {
            bot_id: wire.bot_id,
            bot_version: wire.bot_version,
            bot_session_id: wire.bot_session_id.unwrap_or_default(),
            conversation_id: wire.conversation_id.unwrap_or_default(),
            message_id: wire.message_id.unwrap_or_default(),
            language_code: wire.language_code,
            bot_session_timeout: wire.bot_session_timeout,
            input_message,
            parameters: wire.parameters,
            correlation_id: wire.correlation_id,
        };
        request.validate().map_err(CodecError::unmarshal)?;
        Ok(request)
    }
}

impl Redact for IncomingMessageRequest {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            input_message: self.input_message.redact_with(config),
            ..self.clone()
        }
    }
}

/// Outcome of a bot turn
#[derive(Debug, Clone, PartialEq)]
pub struct BotResult {
    pub bot_state: BotState,
    /// Mandatory when the state is [`BotState::Complete`]
    pub intent: Option<String>,
    /// A confidence of 0 is treated as unreported and is not encoded
    pub confidence: Option<f64>,
    pub entities: Vec<SlotEntity>,
    pub reply_messages: Vec<NormalizedMessage>,
    pub parameters: BTreeMap<String, String>,
    pub error_info: Option<ErrorInfo>,
}

/// The bot's answer to an [`IncomingMessageRequest`]
pub type IncomingMessageResponse = BotResult;

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BotResultWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bot_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    intent: Option<String>,
    #[serde(default, skip_serializing_if = "confidence::is_absent", with = "confidence")]
    confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    entities: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reply_messages: Vec<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_info: Option<ErrorInfo>,
}

impl BotResult {
    pub fn new(bot_state: BotState) -> Self {
        Self {
            bot_state,
            intent: None,
            confidence: None,
            entities: Vec::new(),
            reply_messages: Vec::new(),
            parameters: BTreeMap::new(),
            error_info: None,
        }
    }

    /// A completed turn with its intent
    pub fn complete(intent: impl Into<String>) -> Self {
        Self {
            intent: Some(intent.into()),
            ..Self::new(BotState::Complete)
        }
    }

    /// A failed turn
    pub fn failed(error_info: ErrorInfo) -> Self {
        Self {
            error_info: Some(error_info),
            ..Self::new(BotState::Failed)
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_entity(mut self, entity: SlotEntity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_reply(mut self, message: NormalizedMessage) -> Self {
        self.reply_messages.push(message);
        self
    }

    pub fn validate(&self) -> CodecResult<()> {
        check_intent(Some(self.bot_state.as_str()), self.intent.as_deref()).into_result()
    }

    fn to_wire(&self) -> CodecResult<BotResultWire> {
        Ok(BotResultWire {
            bot_state: Some(self.bot_state.to_string()),
            intent: self.intent.clone(),
            confidence: self.confidence,
            entities: self
                .entities
                .iter()
                .map(Encode::to_value)
                .collect::<CodecResult<_>>()?,
            reply_messages: self
                .reply_messages
                .iter()
                .map(Encode::to_value)
                .collect::<CodecResult<_>>()?,
            parameters: self.parameters.clone(),
            error_info: self.error_info.clone(),
        })
    }

    /// Decode the shared fields, bot state faults land in `merr`
    fn from_wire(
        wire: BotResultWire,
        config: &CodecConfig,
        merr: &mut MultiError,
    ) -> CodecResult<Option<Self>> {
        let entities = wire
            .entities
            .into_iter()
            .map(|value| SlotEntity::from_value_with(value, config))
            .collect::<CodecResult<_>>()?;
        let reply_messages = wire
            .reply_messages
            .into_iter()
            .map(|value| NormalizedMessage::from_value_with(value, config))
            .collect::<CodecResult<_>>()?;

        let state = wire.bot_state.as_deref().unwrap_or_default();
        let intent = wire.intent.filter(|intent| !intent.is_empty());
        merr.merge(check_intent(Some(state), intent.as_deref()));
        let bot_state = match state.parse() {
            Ok(bot_state) => bot_state,
            Err(_) => return Ok(None),
        };
        Ok(Some(Self {
            bot_state,
            intent,
            confidence: wire.confidence,
            entities,
            reply_messages,
            parameters: wire.parameters,
            error_info: wire.error_info,
        }))
    }
}

fn check_intent(state: Option<&str>, intent: Option<&str>) -> MultiError {
    let mut merr = MultiError::new();
    let state = state.unwrap_or_default();
    if let Err(err) = state.parse::<BotState>() {
        merr.push(err);
    }
    if state == BotState::Complete.as_str() && intent.map_or(true, str::is_empty) {
        merr.push(CodecError::missing("intent"));
    }
    merr
}

impl Encode for BotResult {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        serde_json::to_value(self.to_wire()?).map_err(CodecError::marshal)
    }
}

impl Decode for BotResult {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: BotResultWire = serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        let mut merr = MultiError::new();
        let result = BotResult::from_wire(wire, config, &mut merr)?;
        merr.into_result().map_err(CodecError::unmarshal)?;
        result.ok_or_else(|| CodecError::unmarshal(CodecError::missing("botState")))
    }
}

impl Redact for BotResult {
    fn redact_with(&self, config: &CodecConfig) -> Self {
        Self {
            reply_messages: self
                .reply_messages
                .iter()
                .map(|message| message.redact_with(config))
                .collect(),
            ..self.clone()
        }
    }
}

/// A bot turn posted asynchronously to the platform
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessageRequest {
    pub bot_id: String,
    pub bot_version: String,
    pub bot_session_id: Uuid,
    pub message_id: Uuid,
    pub language_code: String,
    pub result: BotResult,
    pub correlation_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingMessageRequestWire {
    #[serde(default)]
    bot_id: String,
    #[serde(default)]
    bot_version: String,
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    bot_session_id: Option<Uuid>,
    #[serde(default, with = "crate::protocol::scalar::uuid_opt")]
    message_id: Option<Uuid>,
    #[serde(default)]
    language_code: String,
    #[serde(flatten)]
    result: BotResultWire,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl OutgoingMessageRequest {
    fn check_ids(&self, merr: &mut MultiError) {
        required_text(merr, "botId", &self.bot_id);
        required_uuid(merr, "botSessionId", &self.bot_session_id);
        required_uuid(merr, "messageId", &self.message_id);
        required_text(merr, "languageCode", &self.language_code);
    }

    pub fn validate(&self) -> CodecResult<()> {
        let mut merr = MultiError::new();
        self.check_ids(&mut merr);
        merr.check(self.result.validate());
        merr.into_result()
    }
}

impl Encode for OutgoingMessageRequest {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        let wire = OutgoingMessageRequestWire {
            bot_id: self.bot_id.clone(),
            bot_version: self.bot_version.clone(),
            bot_session_id: Some(self.bot_session_id),
            message_id: Some(self.message_id),
            language_code: self.language_code.clone(),
            result: self.result.to_wire()?,
            correlation_id: self.correlation_id.clone(),
        };
        serde_json::to_value(wire).map_err(CodecError::marshal)
    }
}

impl Decode for OutgoingMessageRequest {
    fn from_value_with(value: Value, config: &CodecConfig) -> CodecResult<Self> {
        let wire: OutgoingMessageRequestWire =
            serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        let mut merr = MultiError::new();
        let result = BotResult::from_wire(wire.result, config, &mut merr)?;
        let request = result.map(|result| Self {
            bot_id: wire.bot_id,
            bot_version: wire.bot_version,
            bot_session_id: wire.bot_session_id.unwrap_or_default(),
            message_id: wire.message_id.unwrap_or_default(),
            language_code: wire.language_code,
            result,
            correlation_id: wire.correlation_id,
        });
        if let Some(request) = &request {
            request.check_ids(&mut merr);
        }
        merr.into_result().map_err(CodecError::unmarshal)?;
        request.ok_or_else(|| CodecError::unmarshal(CodecError::missing("botState")))
    }
}

/// The platform's acknowledgement of an [`OutgoingMessageRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessageResponse {
    #[serde(with = "crate::protocol::scalar::uuid_opt", default)]
    pub message_id: Option<Uuid>,
}

impl OutgoingMessageResponse {
    pub fn new(message_id: Uuid) -> Self {
        Self {
            message_id: Some(message_id),
        }
    }

    pub fn validate(&self) -> CodecResult<()> {
        match self.message_id {
            Some(_) => Ok(()),
            None => Err(CodecError::missing("messageId")),
        }
    }
}

impl Encode for OutgoingMessageResponse {
    fn to_value(&self) -> CodecResult<Value> {
        self.validate().map_err(CodecError::marshal)?;
        serde_json::to_value(self).map_err(CodecError::marshal)
    }
}

impl Decode for OutgoingMessageResponse {
    fn from_value_with(value: Value, _config: &CodecConfig) -> CodecResult<Self> {
        let response: Self = serde_json::from_value(value).map_err(CodecError::unmarshal)?;
        response.validate().map_err(CodecError::unmarshal)?;
        Ok(response)
    }
}

serde_via_codec!(IncomingMessageRequest, BotResult, OutgoingMessageRequest);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::protocol::{
        content::{ButtonResponseContent, Content, TextContent},
        slot::{SlotKind, SlotValue},
    };

    use super::*;

    fn request_payload() -> Value {
        json!({
            "botId": "support-bot",
            "botVersion": "1.0",
            "botSessionId": "5a0a8a4e-1e3b-4b1f-8e35-6cbbd1b2a3c4",
            "genesysConversationId": "aa06a6fc-1fdf-4e59-b8a1-df3ca44f523e",
            "messageId": "9c6c1d5f-7c1e-4d87-a3b1-7b4ef8b0e2d1",
            "languageCode": "en-US",
            "botSessionTimeout": 4320,
            "inputMessage": {"type": "Text", "text": "I want to check my order"},
            "parameters": {"customerTier": "gold"}
        })
    }

    #[test]
    fn test_incoming_request_decodes() {
        let request = IncomingMessageRequest::from_value(request_payload()).unwrap();
        assert_eq!(request.bot_id, "support-bot");
        assert_eq!(request.bot_session_timeout, 4320);
        assert_eq!(request.input_message.text, "I want to check my order");
        assert_eq!(request.parameters["customerTier"], "gold");
        assert_eq!(request.to_value().unwrap(), request_payload());
    }

    #[test]
    fn test_incoming_request_faults_are_collected() {
        let mut payload = request_payload();
        payload["botId"] = json!("");
        payload["botSessionTimeout"] = json!(0);
        payload["messageId"] = json!("00000000-0000-0000-0000-000000000000");

        let err = IncomingMessageRequest::from_value(payload).unwrap_err();
        assert!(err.is_json_unmarshal());
        match &err {
            CodecError::JsonUnmarshal(inner) => match inner.as_ref() {
                CodecError::Multi(multi) => assert_eq!(multi.len(), 3),
                other => panic!("unexpected error: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("botSessionTimeout"));
    }

    #[test]
    fn test_structured_input_only_carries_button_responses() {
        let mut request = IncomingMessageRequest::from_value(request_payload()).unwrap();
        request.input_message = NormalizedMessage::structured(vec![Content::from(
            ButtonResponseContent::new("Yes", "yes"),
        )]);
        assert!(request.validate().is_ok());

        request
            .input_message
            .content
            .push(Content::from(TextContent::new("hello")));
        let err = request.to_value().unwrap_err();
        assert!(err.is_json_marshal());
        assert!(err.is_argument_invalid());
    }

    #[test]
    fn test_content_fault_joins_field_faults() {
        let mut request = IncomingMessageRequest::from_value(request_payload()).unwrap();
        request.bot_id = String::new();
        request.input_message =
            NormalizedMessage::structured(vec![Content::from(TextContent::new("hello"))]);

        match request.validate().unwrap_err() {
            CodecError::Multi(multi) => {
                assert_eq!(multi.len(), 2);
                assert_eq!(multi.errors()[0].missing_argument(), Some("botId"));
                assert!(multi.errors()[1].is_argument_invalid());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bot_state_table() {
        let cases = [
            ("Complete", Some("order_status"), true),
            ("Complete", None, false),
            ("Complete", Some(""), false),
            ("Failed", None, true),
            ("MoreData", None, true),
            ("MoreData", Some("order_status"), true),
            ("Done", Some("order_status"), false),
            ("", None, false),
        ];
        for (state, intent, valid) in cases {
            let mut payload = json!({"botState": state});
            if let Some(intent) = intent {
                payload["intent"] = json!(intent);
            }
            assert_eq!(
                BotResult::from_value(payload).is_ok(),
                valid,
                "{state} / {intent:?}"
            );
        }
    }

    #[test]
    fn test_confidence_zero_is_absent() {
        let result = BotResult::from_value(json!({"botState": "MoreData", "confidence": 0})).unwrap();
        assert_eq!(result.confidence, None);

        let result = BotResult::new(BotState::MoreData);
        assert!(result.to_value().unwrap().get("confidence").is_none());

        let result = BotResult::complete("greeting").with_confidence(0.87);
        assert_eq!(result.to_value().unwrap()["confidence"], json!(0.87));

        let result = BotResult::complete("greeting").with_confidence(0.0);
        let value = result.to_value().unwrap();
        assert!(value.get("confidence").is_none());
        assert_eq!(BotResult::from_value(value).unwrap().confidence, None);
    }

    #[test]
    fn test_response_with_entities_and_replies() {
        let response = IncomingMessageResponse::complete("order_status")
            .with_confidence(0.92)
            .with_entity(SlotEntity::parse(SlotKind::Integer, "orderNumber", "12345").unwrap())
            .with_reply(NormalizedMessage::text("Let me look that up"));
        let value = response.to_value().unwrap();
        assert_eq!(value["entities"][0]["value"], "12345");

        let decoded = IncomingMessageResponse::from_value(value).unwrap();
        assert_eq!(decoded.entities[0].value, SlotValue::Integer(12345));
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_complete_without_intent_is_refused() {
        let err = BotResult::new(BotState::Complete).to_value().unwrap_err();
        assert!(err.is_json_marshal());
        assert_eq!(err.missing_argument(), Some("intent"));
    }

    #[test]
    fn test_outgoing_request() {
        let request = OutgoingMessageRequest {
            bot_id: "support-bot".to_string(),
            bot_version: "1.0".to_string(),
            bot_session_id: Uuid::now_v7(),
            message_id: Uuid::now_v7(),
            language_code: "en-US".to_string(),
            result: BotResult::failed(ErrorInfo::new("BotNotFound", "no such bot")),
            correlation_id: Some("abc".to_string()),
        };
        let value = request.to_value().unwrap();
        assert_eq!(value["botState"], "Failed");
        assert_eq!(value["errorInfo"]["errorCode"], "BotNotFound");
        assert_eq!(OutgoingMessageRequest::from_value(value).unwrap(), request);

        let err = OutgoingMessageRequest::from_value(json!({"botState": "Failed"})).unwrap_err();
        assert!(err.is_argument_missing());
    }

    #[test]
    fn test_outgoing_response() {
        let id = Uuid::now_v7();
        let value = OutgoingMessageResponse::new(id).to_value().unwrap();
        assert_eq!(value, json!({"messageId": id.to_string()}));

        let err = OutgoingMessageResponse::from_value(json!({})).unwrap_err();
        assert_eq!(err.missing_argument(), Some("messageId"));
    }
}
