
use crate::Result;

/// Produces a natural-language answer grounded on retrieved context
pub trait AnswerComposer: Send + Sync {
    fn complete(&self, system_directive: &str, context: &str, question: &str) -> Result<String>;
}

/// Directive instructing the model to answer strictly from the supplied context
#[inline]
pub fn system_directive(subject: &str) -> String {
    format!(
        "You are {}'s professional AI agent. Answer the user's question ONLY based on the context provided below. \
         If the answer is not in the context, state that you don't have enough information. Do not invent facts.",
        subject
    )
}

/// Full system message sent to the model: the directive followed by the context block
#[inline]
pub fn system_message(system_directive: &str, context: &str) -> String {
    format!("{}\n\nContext:\n{}", system_directive, context)
}
