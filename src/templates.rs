//! Built-in meta-prompt templates

use std::collections::BTreeMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::prompt::MetaPrompt;

/// A named, reusable meta-prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate
{   pub id: String
  , pub name: String
  , pub category: String
  , pub mode: String
  , pub content: MetaPrompt
}

impl PromptTemplate
{   fn key(&self) -> String
    {   template_key(&self.category, &self.mode, &self.id)
    }
}

fn template_key(category: &str, mode: &str, id: &str) -> String
{   format!("{}:{}:{}", category, mode, id)
}

/// Templates keyed by `category:mode:id`, iterated in key order
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary
{   templates: BTreeMap<String, PromptTemplate>
}

impl TemplateLibrary
{   /// Library preloaded with the built-in templates
    pub fn new() -> Self
    {   let mut library = TemplateLibrary::empty();
        for template in default_templates()
        {   library.add(template);
        }
        library
    }

    pub fn empty() -> Self
    {   TemplateLibrary::default()
    }

    /// Insert or replace a template
    pub fn add(&mut self, template: PromptTemplate)
    {   debug!("Adding template {}", template.key());
        self.templates.insert(template.key(), template);
    }

    pub fn get(&self, category: &str, mode: &str, id: &str)
      -> Option<&PromptTemplate>
    {   self.templates.get(&template_key(category, mode, id))
    }

    pub fn for_category(&self, category: &str) -> Vec<&PromptTemplate>
    {   self.iter()
          .filter(|t| t.category == category)
          .collect()
    }

    pub fn for_mode(&self, category: &str, mode: &str)
      -> Vec<&PromptTemplate>
    {   self.iter()
          .filter(|t| t.category == category && t.mode == mode)
          .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptTemplate>
    {   self.templates.values()
    }

    pub fn len(&self) -> usize
    {   self.templates.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.templates.is_empty()
    }
}

fn default_templates() -> Vec<PromptTemplate>
{   vec![
      PromptTemplate
      {   id: "content-generation".to_string()
        , name: "Content Generation".to_string()
        , category: "expansion".to_string()
        , mode: "content".to_string()
        , content: MetaPrompt::new(
            "Transform brief topic ideas into comprehensive, \
             well-structured content",
            [
              "Create an engaging introduction that hooks the reader"
            , "Develop at least 3 main points or sections"
            , "Include relevant examples or case studies"
            , "Maintain a consistent tone and style"
            , "Add a compelling conclusion that ties everything together"
            , "Use transition sentences between sections"
            ]
          )
          .with_sections(["introduction", "main_points", "examples", "conclusion"])
          .with_variables(["topic", "target_length", "tone"])
      }
    , PromptTemplate
      {   id: "explanation".to_string()
        , name: "Explanation".to_string()
        , category: "expansion".to_string()
        , mode: "explain".to_string()
        , content: MetaPrompt::new(
            "Convert complex concepts into clear, accessible explanations",
            [
              "Start with a simple, high-level overview"
            , "Break down complex terms into simpler components"
            , "Use analogies or metaphors to illustrate concepts"
            , "Progress from basic to advanced understanding"
            , "Include practical examples or applications"
            , "Address common misconceptions"
            ]
          )
          .with_sections([
            "overview", "key_concepts", "analogies", "examples",
            "common_questions"
          ])
          .with_variables(["concept", "audience_expertise", "desired_depth"])
      }
    ]
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn built_ins_are_loaded()
    {   let library = TemplateLibrary::new();
        assert_eq!(library.len(), 2);
        let template = library
          .get("expansion", "content", "content-generation")
          .unwrap();
        assert_eq!(template.content.instructions.len(), 6);
        assert_eq!(
          template.content.sections.as_deref().unwrap().first().unwrap(),
          "introduction"
        );
    }

    #[test]
    fn filters_by_category_and_mode()
    {   let library = TemplateLibrary::new();
        assert_eq!(library.for_category("expansion").len(), 2);
        assert!(library.for_category("compression").is_empty());

        let explain = library.for_mode("expansion", "explain");
        assert_eq!(explain.len(), 1);
        assert_eq!(explain[0].id, "explanation");
    }

    #[test]
    fn add_replaces_same_key()
    {   let mut library = TemplateLibrary::new();
        let mut replacement = library
          .get("expansion", "explain", "explanation")
          .unwrap()
          .clone();
        replacement.name = "Plain Explanation".to_string();
        library.add(replacement);

        assert_eq!(library.len(), 2);
        assert_eq!(
          library.get("expansion", "explain", "explanation").unwrap().name,
          "Plain Explanation"
        );
    }

    #[test]
    fn iteration_follows_key_order()
    {   let mut library = TemplateLibrary::empty();
        for id in ["b", "a"]
        {   library.add(PromptTemplate
            {   id: id.to_string()
              , name: id.to_uppercase()
              , category: "compression".to_string()
              , mode: "summary".to_string()
              , content: MetaPrompt::new("p", ["i"])
            });
        }
        let ids: Vec<&str> = library.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
