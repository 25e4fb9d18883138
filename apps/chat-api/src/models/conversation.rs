use super::message::Message;

/// A two-party channel keyed by the unordered pair of participant IDs.
#[derive(Debug, Clone)]
pub struct PrivateConversation {
    pub id: String,
    pub users: [String; 2],
    pub messages: Vec<Message>,
}

impl PrivateConversation {
    pub fn new(a: &str, b: &str) -> Self {
        let mut users = [a.to_string(), b.to_string()];
        users.sort();
        Self {
            id: conversation_id(a, b),
            users,
            messages: Vec::new(),
        }
    }
}

/// Deterministic conversation ID: both IDs sorted and joined with `_`, so
/// `conversation_id(a, b) == conversation_id(b, a)`.
pub fn conversation_id(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}
