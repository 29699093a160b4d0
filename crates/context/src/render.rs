//! Prompt rendering for both modes: section-headered text for
//! multi-layer mode, a flat transcript for legacy mode.

use crate::window::{ContextWindow, Mode};

impl ContextWindow {
    /// Renders the window as prompt text. In multi-layer mode this emits
    /// the four sections in distant-to-recent order with a clarity-boundary
    /// marker between summary and verbatim history; in legacy mode it's the
    /// flat entry list, newest first.
    pub fn to_prompt_text(&self) -> String {
        match self.mode {
            Mode::MultiLayer => {
                let sections: Vec<String> =
                    [self.system_prompt_sections(), self.user_context_sections()].concat();
                sections.join("\n")
            }
            Mode::Legacy => self.render_legacy(),
        }
    }

    /// The background half of the window: summarised distant/recent history
    /// plus the clarity-boundary marker, everything above the verbatim tail.
    /// Legacy mode has no such split — the whole transcript is conversation,
    /// so this is always the empty string there.
    pub fn to_system_prompt(&self) -> String {
        match self.mode {
            Mode::MultiLayer => self.system_prompt_sections().join("\n"),
            Mode::Legacy => String::new(),
        }
    }

    /// The live half of the window: verbatim conversation plus anything
    /// retrieved for the current turn. In legacy mode this is the same flat
    /// transcript `to_prompt_text` renders, since there's no summary split.
    pub fn to_user_context(&self) -> String {
        match self.mode {
            Mode::MultiLayer => self.user_context_sections().join("\n"),
            Mode::Legacy => self.render_legacy(),
        }
    }

    fn system_prompt_sections(&self) -> Vec<String> {
        let mut sections = Vec::new();

        if !self.distant_summary.is_empty() {
            sections.push(format!("## Distant Context\n{}\n", self.distant_summary));
        }

        if !self.recent_summary.is_empty() {
            sections.push(format!("## Recent Context\n{}\n", self.recent_summary));
        }

        if self.clarity_boundary.is_some() {
            sections.push("--- Clarity Boundary: everything below is verbatim ---".to_string());
        }

        sections
    }

    fn user_context_sections(&self) -> Vec<String> {
        let mut sections = Vec::new();

        if !self.full_detail.is_empty() {
            let mut block = String::from("## Conversation\n");
            for entry in self.full_detail.iter().rev() {
                block.push_str(&format!("[{}] {}\n", entry.role, entry.content));
            }
            sections.push(block);
        }

        if !self.retrieved_context.is_empty() {
            let mut block = String::from("## Retrieved Context\n");
            for item in &self.retrieved_context {
                block.push_str(&format!("- {}\n", item.content));
            }
            sections.push(block);
        }

        sections
    }

    fn render_legacy(&self) -> String {
        let mut out = String::new();
        for entry in self.entries.iter().rev() {
            out.push_str(&entry.content);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::EntryKind;
    use crate::window::MultiLayerOpts;
    use cogmem_core::AgentId;

    #[test]
    fn multi_layer_sections_appear_distant_to_recent() {
        let mut w = ContextWindow::new_multi_layer(AgentId::from("a1"), Default::default()).unwrap();
        w.distant_summary = "long ago things happened".to_string();
        w.recent_summary = "recently, more things happened".to_string();
        w.add_user_message("hello").unwrap();
        w.clarity_boundary = Some(chrono::Utc::now());

        let text = w.to_prompt_text();
        let distant_pos = text.find("## Distant Context").unwrap();
        let recent_pos = text.find("## Recent Context").unwrap();
        let boundary_pos = text.find("Clarity Boundary").unwrap();
        let conversation_pos = text.find("## Conversation").unwrap();
        assert!(distant_pos < recent_pos);
        assert!(recent_pos < boundary_pos);
        assert!(boundary_pos < conversation_pos);
    }

    #[test]
    fn empty_multi_layer_window_renders_empty() {
        let w = ContextWindow::new_multi_layer(AgentId::from("a1"), MultiLayerOpts::default()).unwrap();
        assert_eq!(w.to_prompt_text(), "");
    }

    #[test]
    fn legacy_renders_newest_last() {
        let mut w = ContextWindow::new_legacy(AgentId::from("a1"), 1_000, 0.8);
        w.add_entry(EntryKind::Message, "first").unwrap();
        w.add_entry(EntryKind::Message, "second").unwrap();
        let text = w.to_prompt_text();
        assert!(text.find("first").unwrap() < text.find("second").unwrap());
    }

    #[test]
    fn multi_layer_splits_summaries_from_conversation() {
        let mut w = ContextWindow::new_multi_layer(AgentId::from("a1"), Default::default()).unwrap();
        w.distant_summary = "long ago things happened".to_string();
        w.recent_summary = "recently, more things happened".to_string();
        w.add_user_message("hello").unwrap();
        w.clarity_boundary = Some(chrono::Utc::now());

        let system = w.to_system_prompt();
        assert!(system.contains("## Distant Context"));
        assert!(system.contains("## Recent Context"));
        assert!(system.contains("Clarity Boundary"));
        assert!(!system.contains("## Conversation"));

        let user = w.to_user_context();
        assert!(user.contains("## Conversation"));
        assert!(user.contains("hello"));
        assert!(!user.contains("## Distant Context"));

        assert_eq!(w.to_prompt_text(), format!("{}\n{}", system, user));
    }

    #[test]
    fn legacy_system_prompt_is_empty_and_user_context_matches_prompt_text() {
        let mut w = ContextWindow::new_legacy(AgentId::from("a1"), 1_000, 0.8);
        w.add_entry(EntryKind::Message, "first").unwrap();
        assert_eq!(w.to_system_prompt(), "");
        assert_eq!(w.to_user_context(), w.to_prompt_text());
    }
}
