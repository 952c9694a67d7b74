use super::message::Message;

/// The caller's primary input to `generate`: either a bare prompt or the
/// conversation history so far.
///
/// Anything convertible into an `Input` can be passed to `generate`
/// directly, so most callers never name this type:
///
/// ```
/// use khulnasoft::{Input, Message};
///
/// let from_prompt: Input = "hello".into();
/// let from_history: Input = vec![Message::user("hello")].into();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A single prompt, sent as one user message.
    Prompt(String),
    /// Pre-built conversation history, sent unmodified.
    History(Vec<Message>),
}

impl Input {
    /// Normalize into the ordered message list the remote protocol expects:
    /// the system prompt (when supplied and non-empty) first, then the
    /// input. History order is preserved as given; the remote endpoint
    /// relies on this exact ordering.
    pub fn into_messages(self, system_prompt: Option<&str>) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(system) = system_prompt.filter(|prompt| !prompt.is_empty()) {
            messages.push(Message::system(system));
        }
        match self {
            Input::Prompt(prompt) => messages.push(Message::user(prompt)),
            Input::History(history) => messages.extend(history),
        }
        messages
    }
}

impl From<&str> for Input {
    fn from(prompt: &str) -> Self {
        Input::Prompt(prompt.to_string())
    }
}

impl From<String> for Input {
    fn from(prompt: String) -> Self {
        Input::Prompt(prompt)
    }
}

impl From<Message> for Input {
    fn from(message: Message) -> Self {
        Input::History(vec![message])
    }
}

impl From<Vec<Message>> for Input {
    fn from(history: Vec<Message>) -> Self {
        Input::History(history)
    }
}

impl From<&[Message]> for Input {
    fn from(history: &[Message]) -> Self {
        Input::History(history.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::message::Role;

    #[test]
    fn test_system_prompt_comes_before_the_user_message() {
        let messages = Input::from("U").into_messages(Some("S"));
        assert_eq!(
            messages,
            vec![Message::system("S"), Message::user("U")]
        );
    }

    #[test]
    fn test_history_is_passed_through_unmodified() {
        let history = vec![Message::user("A"), Message::assistant("B")];
        let messages = Input::from(history.clone()).into_messages(None);
        assert_eq!(messages, history);
    }

    #[test]
    fn test_system_prompt_is_prepended_to_history() {
        let history = vec![Message::user("A"), Message::assistant("B")];
        let messages = Input::from(history).into_messages(Some("S"));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], Message::system("S"));
        assert_eq!(messages[1].content, "A");
        assert_eq!(messages[2].content, "B");
    }

    #[test]
    fn test_empty_system_prompt_is_ignored() {
        let messages = Input::from("U").into_messages(Some(""));
        assert_eq!(messages, vec![Message::user("U")]);
    }

    #[test]
    fn test_bare_prompt_becomes_a_user_message() {
        let messages = Input::from("hello".to_string()).into_messages(None);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
    }

    #[test]
    fn test_single_message_converts_to_one_item_history() {
        let input: Input = Message::assistant("prior reply").into();
        assert_eq!(
            input,
            Input::History(vec![Message::assistant("prior reply")])
        );
    }
}
