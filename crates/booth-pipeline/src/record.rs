use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Records delivered to the caller, in emission order.
///
/// A successful run emits exactly `Stt` then `Final`; any fatal failure
/// replaces the remaining records with a single terminal `Error`. No record
/// is ever emitted out of order and an error always ends the sequence.
pub enum ReplyRecord {
    /// Progressive-disclosure record: the recognized text, emitted as soon as
    /// recognition completes and before the reply is generated.
    Stt { text: String },
    /// Terminal success record with the reply text and base64 final audio.
    Final {
        reply_text: String,
        audio_base64: String,
    },
    /// Terminal failure record.
    Error { message: String },
}
