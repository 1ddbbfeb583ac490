//! Meta-prompt compilation
//!
//! A `MetaPrompt` is compiled into either a flat system prompt
//! (`Purpose:` / `Instructions:` / `Required Sections:` blocks under a
//! base line naming the mode) or a tagged composite that wraps the input
//! text. The adapter picks the style, never the mode.

use std::str::FromStr;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::PromptMode;

/// Structured instruction set compiled into a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPrompt
{   pub purpose: String
  , /// Rendered in order, one line each
    pub instructions: Vec<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>
  , /// Carried for templates; no renderer reads it yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>
}

impl MetaPrompt
{   pub fn new<I, S>(purpose: impl Into<String>, instructions: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   MetaPrompt
        {   purpose: purpose.into()
          , instructions: instructions.into_iter().map(Into::into).collect()
          , sections: None
          , variables: None
        }
    }

    pub fn with_sections<I, S>(mut self, sections: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   self.sections = Some(sections.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
      I: IntoIterator<Item = S>
    , S: Into<String>
    {   self.variables
          = Some(variables.into_iter().map(Into::into).collect());
        self
    }

    fn sections(&self) -> &[String]
    {   self.sections.as_deref().unwrap_or(&[])
    }
}

/// Rendering style an adapter asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle
{   /// System prompt and input travel separately
    #[default]
    Flat
  , /// Meta-prompt and input fused into one tagged prompt
    Tagged
}

impl FromStr for PromptStyle
{   type Err = crate::error::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err>
    {   match raw.trim().to_ascii_lowercase().as_str()
        {   "flat" => Ok(PromptStyle::Flat)
          , "tagged" => Ok(PromptStyle::Tagged)
          , other => Err(crate::error::Error::InvalidConfiguration(
              format!("unknown prompt style: {}", other)
            ))
        }
    }
}

/// What an adapter receives after rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt
{   /// Empty when the style folds everything into `input`
    pub system: String
  , pub input: String
}

impl RenderedPrompt
{   /// Input alone, with no system prompt
    pub fn plain(input: &str) -> Self
    {   RenderedPrompt
        {   system: String::new()
          , input: input.to_string()
        }
    }
}

/// Compile a flat system prompt dated today
pub fn compile(mode: PromptMode, meta: Option<&MetaPrompt>) -> String
{   compile_on(mode, meta, chrono::Local::now().date_naive())
}

/// Compile a flat system prompt for an explicit date
pub fn compile_on(
  mode: PromptMode
, meta: Option<&MetaPrompt>
, date: NaiveDate
) -> String
{   let mut prompt = format!(
      "You are an expert at {}. The current date is: {}",
      mode,
      date.format("%Y-%m-%d")
    );

    let Some(meta) = meta else { return prompt };

    prompt.push_str(&format!(
      "\n\nPurpose: {}\n\nInstructions:",
      meta.purpose
    ));
    for instruction in &meta.instructions
    {   prompt.push_str(&format!("\n- {}", instruction));
    }

    if !meta.sections().is_empty()
    {   prompt.push_str("\n\nRequired Sections:");
        for section in meta.sections()
        {   prompt.push_str(&format!("\n- {}", section));
        }
    }
    prompt
}

/// Wrap the input in purpose/instructions/input tags.
/// Without a meta-prompt the input is returned untouched.
pub fn compile_tagged(meta: Option<&MetaPrompt>, input: &str) -> String
{   match meta
    {   None => input.to_string()
      , Some(meta) => format!(
          "<purpose>\n{}\n</purpose>\n\n\
           <instructions>\n{}\n</instructions>\n\n\
           <input>\n{}\n</input>",
          meta.purpose,
          meta.instructions.join("\n"),
          input
        )
    }
}

/// Render a request in the style the target adapter wants
pub fn render(
  style: PromptStyle
, mode: PromptMode
, meta: Option<&MetaPrompt>
, input: &str
) -> RenderedPrompt
{   match style
    {   PromptStyle::Flat => RenderedPrompt
        {   system: compile(mode, meta)
          , input: input.to_string()
        }
      , PromptStyle::Tagged => RenderedPrompt
        {   system: String::new()
          , input: compile_tagged(meta, input)
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    fn day() -> NaiveDate
    {   NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn base_line_only_without_meta()
    {   let prompt = compile_on(PromptMode::Expansion, None, day());
        assert_eq!(
          prompt,
          "You are an expert at expansion. The current date is: 2024-03-09"
        );
    }

    #[test]
    fn full_layout_with_sections()
    {   let meta = MetaPrompt::new("Summarize", ["be brief", "cite"])
          .with_sections(["intro", "body"]);
        let prompt = compile_on(PromptMode::Compression, Some(&meta), day());
        assert_eq!(
          prompt,
          "You are an expert at compression. The current date is: 2024-03-09\n\
           \n\
           Purpose: Summarize\n\
           \n\
           Instructions:\n\
           - be brief\n\
           - cite\n\
           \n\
           Required Sections:\n\
           - intro\n\
           - body"
        );
    }

    #[test]
    fn empty_sections_add_nothing()
    {   let meta = MetaPrompt::new("p", ["i"]).with_sections(Vec::<String>::new());
        let prompt = compile_on(PromptMode::Action, Some(&meta), day());
        assert!(!prompt.contains("Required Sections"));
        assert!(prompt.ends_with("Instructions:\n- i"));
    }

    #[test]
    fn ordering_is_preserved()
    {   let instructions: Vec<String>
          = (0..20).rev().map(|i| format!("step {}", i)).collect();
        let sections = ["zeta", "alpha", "mu"];
        let meta = MetaPrompt::new("order", instructions.clone())
          .with_sections(sections);
        let prompt = compile_on(PromptMode::Reasoning, Some(&meta), day());

        let rendered: Vec<&str> = prompt
          .lines()
          .filter_map(|line| line.strip_prefix("- "))
          .collect();
        let expected: Vec<&str> = instructions
          .iter()
          .map(String::as_str)
          .chain(sections)
          .collect();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn variables_do_not_render()
    {   let meta = MetaPrompt::new("p", ["i"]).with_variables(["topic"]);
        let prompt = compile_on(PromptMode::Seeker, Some(&meta), day());
        assert!(!prompt.contains("topic"));
    }

    #[test]
    fn tagged_wraps_input()
    {   let meta = MetaPrompt::new("test", ["do X", "do Y"]);
        assert_eq!(
          compile_tagged(Some(&meta), "hello"),
          "<purpose>\ntest\n</purpose>\n\n\
           <instructions>\ndo X\ndo Y\n</instructions>\n\n\
           <input>\nhello\n</input>"
        );
    }

    #[test]
    fn tagged_without_meta_is_plain_input()
    {   assert_eq!(compile_tagged(None, "just this"), "just this");
    }

    #[test]
    fn render_picks_style()
    {   let meta = MetaPrompt::new("test", ["do X"]);

        let flat = render(
          PromptStyle::Flat, PromptMode::Expansion, Some(&meta), "hello"
        );
        assert!(flat.system.contains("Purpose: test"));
        assert_eq!(flat.input, "hello");

        let tagged = render(
          PromptStyle::Tagged, PromptMode::Expansion, Some(&meta), "hello"
        );
        assert!(tagged.system.is_empty());
        assert!(tagged.input.starts_with("<purpose>"));
        assert!(tagged.input.contains("<input>\nhello\n</input>"));
    }

    #[test]
    fn style_parses_case_insensitively()
    {   assert_eq!("Tagged".parse::<PromptStyle>(), Ok(PromptStyle::Tagged));
        assert!("fancy".parse::<PromptStyle>().is_err());
    }

    #[test]
    fn meta_prompt_reads_without_optional_fields()
    {   let meta: MetaPrompt = serde_json::from_str(
          r#"{"purpose":"test","instructions":["do X"]}"#
        ).unwrap();
        assert_eq!(meta, MetaPrompt::new("test", ["do X"]));
    }
}
