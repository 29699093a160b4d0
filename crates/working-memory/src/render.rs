//! Prompt rendering: ordered sections, temporal thought grouping, and the
//! structured `to_prompt_context` equivalent.

use chrono::{Datelike, Utc};
use serde_json::{json, Value};

use crate::memory::WorkingMemory;

#[derive(Debug, Clone, Default)]
pub struct PromptTextOpts {
    pub include_identity: bool,
    pub group_thoughts_temporally: bool,
    pub thought_limit: Option<usize>,
}

impl Default for PromptTextOpts {
    fn default() -> Self {
        Self {
            include_identity: true,
            group_thoughts_temporally: true,
            thought_limit: None,
        }
    }
}

fn days_ago_label(days: i64) -> String {
    match days {
        0 => "### Today".to_string(),
        1 => "### Yesterday".to_string(),
        n => format!("### {n} days ago"),
    }
}

impl WorkingMemory {
    pub fn to_prompt_text(&self, opts: PromptTextOpts) -> String {
        let mut sections: Vec<String> = Vec::new();

        if opts.include_identity {
            let mut identity = String::new();
            if let Some(name) = &self.name {
                identity.push_str(&format!("## Identity\nI am {name}.\n"));
            }
            if !identity.is_empty() {
                sections.push(identity);
            }
        }

        if self.relationship_context.is_some() || self.current_human.is_some() {
            let mut rel = String::from("## Relationship Context\n");
            if let Some(human) = &self.current_human {
                rel.push_str(&format!("Current human: {human}\n"));
            }
            if let Some(ctx) = &self.relationship_context {
                rel.push_str(&format!("{ctx}\n"));
            }
            sections.push(rel);
        }

        if !self.active_goals.is_empty() {
            let mut goals = String::from("## Active Goals\n");
            for g in &self.active_goals {
                goals.push_str(&format!("- [{}] {} ({}% complete)\n", g.priority, g.description, g.progress));
            }
            sections.push(goals);
        }

        let thoughts: Vec<_> = match opts.thought_limit {
            Some(limit) => self.recent_thoughts.iter().take(limit).collect(),
            None => self.recent_thoughts.iter().collect(),
        };
        if !thoughts.is_empty() {
            let mut block = String::from("## Recent Thoughts\n");
            if opts.group_thoughts_temporally {
                let now = Utc::now();
                let mut last_header: Option<i64> = None;
                for t in &thoughts {
                    let days = (now.date_naive() - t.timestamp.date_naive()).num_days();
                    if last_header != Some(days) {
                        block.push_str(&format!("{}\n", days_ago_label(days)));
                        last_header = Some(days);
                    }
                    block.push_str(&format!("- {}", t.content));
                    if let Some(refd) = t.referenced_date {
                        block.push_str(&format!(" (refers to {}-{:02}-{:02})", refd.year(), refd.month(), refd.day()));
                    }
                    block.push('\n');
                }
            } else {
                for t in &thoughts {
                    block.push_str(&format!("- {}\n", t.content));
                }
            }
            sections.push(block);
        }

        if !self.concerns.is_empty() {
            let mut block = String::from("## Current Concerns\n");
            for c in &self.concerns {
                block.push_str(&format!("- {c}\n"));
            }
            sections.push(block);
        }

        if !self.curiosity.is_empty() {
            let mut block = String::from("## Things I'm Curious About\n");
            for c in &self.curiosity {
                block.push_str(&format!("- {c}\n"));
            }
            sections.push(block);
        }

        sections.join("\n")
    }

    pub fn to_prompt_context(&self, opts: PromptTextOpts) -> Value {
        let thoughts: Vec<&str> = match opts.thought_limit {
            Some(limit) => self.recent_thoughts.iter().take(limit).map(|t| t.content.as_str()).collect(),
            None => self.recent_thoughts.iter().map(|t| t.content.as_str()).collect(),
        };
        let goals: Vec<&str> = self.active_goals.iter().map(|g| g.description.as_str()).collect();
        json!({
            "name": self.name,
            "current_human": self.current_human,
            "relationship_context": self.relationship_context,
            "thoughts": thoughts,
            "goals": goals,
            "concerns": self.concerns,
            "curiosity": self.curiosity,
            "engagement_level": self.engagement_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_core::AgentId;

    #[test]
    fn empty_working_memory_with_identity_disabled_renders_empty() {
        let w = WorkingMemory::new(AgentId::from("a1"), Default::default());
        let text = w.to_prompt_text(PromptTextOpts { include_identity: false, ..Default::default() });
        assert_eq!(text, "");
    }

    #[test]
    fn sections_appear_in_spec_order() {
        let mut w = WorkingMemory::new(AgentId::from("a1"), Default::default());
        w.set_name(Some("Ada".to_string()));
        w.add_goal("Ship v1");
        w.add_thought("thinking about the release");
        w.add_concern("flaky test");
        w.add_curiosity("how decay works");

        let text = w.to_prompt_text(PromptTextOpts::default());
        let identity_pos = text.find("## Identity").unwrap();
        let goals_pos = text.find("## Active Goals").unwrap();
        let thoughts_pos = text.find("## Recent Thoughts").unwrap();
        let concerns_pos = text.find("## Current Concerns").unwrap();
        let curiosity_pos = text.find("## Things I'm Curious About").unwrap();
        assert!(identity_pos < goals_pos);
        assert!(goals_pos < thoughts_pos);
        assert!(thoughts_pos < concerns_pos);
        assert!(concerns_pos < curiosity_pos);
    }

    #[test]
    fn thoughts_are_grouped_under_today_header() {
        let mut w = WorkingMemory::new(AgentId::from("a1"), Default::default());
        w.add_thought("just now");
        let text = w.to_prompt_text(PromptTextOpts::default());
        assert!(text.contains("### Today"));
    }
}
