//! Template renderer module.
//!
//! Renders parsed template nodes with the given context.

use super::parser::Node;
use super::{escape_html, Result, TemplateContext, TemplateError, Value};

/// Template renderer.
pub struct Renderer<'a> {
    context: &'a TemplateContext,
}

impl<'a> Renderer<'a> {
    /// Create a new renderer with the given context.
    pub fn new(context: &'a TemplateContext) -> Self {
        Self { context }
    }

    /// Render a list of nodes to a string.
    pub fn render(&self, nodes: &[Node]) -> Result<String> {
        let mut output = String::new();

        for node in nodes {
            output.push_str(&self.render_node(node)?);
        }

        Ok(output)
    }

    fn render_node(&self, node: &Node) -> Result<String> {
        match node {
            Node::Text(text) => Ok(text.clone()),
            Node::Variable(name) => Ok(escape_html(&self.lookup(name))),
            Node::RawVariable(name) => Ok(self.lookup(name)),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.is_truthy(condition) {
                    self.render(then_branch)
                } else {
                    self.render(else_branch)
                }
            }
            Node::Each {
                variable,
                item_name,
                body,
            } => self.render_each(variable, item_name.as_deref(), body),
            Node::Unless { condition, body } => {
                if self.is_truthy(condition) {
                    Ok(String::new())
                } else {
                    self.render(body)
                }
            }
            Node::With { variable, body } => self.render_with(variable, body),
        }
    }

    /// Missing variables render as empty (like Handlebars).
    fn lookup(&self, name: &str) -> String {
        self.context
            .get(name)
            .map(|v| v.to_display_string())
            .unwrap_or_default()
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.context.get(name).is_some_and(|v| v.is_truthy())
    }

    fn render_each(&self, variable: &str, item_name: Option<&str>, body: &[Node]) -> Result<String> {
        let list = match self.context.get(variable) {
            Some(Value::List(items)) => items,
            Some(Value::Null) | None => return Ok(String::new()),
            Some(_) => {
                return Err(TemplateError::Render(format!("'{variable}' is not a list")));
            }
        };

        let mut output = String::new();
        let item_var_name = item_name.unwrap_or("this");

        for (index, item) in list.iter().enumerate() {
            let mut child_context = self.context.child();
            child_context.set(item_var_name, item.clone());
            child_context.set("@index", Value::Number(index as i64));
            child_context.set("@first", Value::Bool(index == 0));
            child_context.set("@last", Value::Bool(index == list.len() - 1));

            // Object fields are also exposed directly
            if let Value::Object(obj) = item {
                for (key, value) in obj {
                    child_context.set(key.clone(), value.clone());
                }
            }

            let child_renderer = Renderer::new(&child_context);
            output.push_str(&child_renderer.render(body)?);
        }

        Ok(output)
    }

    fn render_with(&self, variable: &str, body: &[Node]) -> Result<String> {
        let value = match self.context.get(variable) {
            Some(v) => v.clone(),
            None => return Ok(String::new()),
        };

        let mut child_context = self.context.child();

        if let Value::Object(obj) = &value {
            for (key, val) in obj {
                child_context.set(key.clone(), val.clone());
            }
        }
        child_context.set("this", value);

        let child_renderer = Renderer::new(&child_context);
        child_renderer.render(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Parser;
    use std::collections::HashMap;

    fn render(template: &str, context: &TemplateContext) -> String {
        let nodes = Parser::new(template).parse().unwrap();
        Renderer::new(context).render(&nodes).unwrap()
    }

    fn thread(title: &str, closed: bool) -> Value {
        let mut map = HashMap::new();
        map.insert("title".to_string(), Value::string(title));
        map.insert("closed".to_string(), Value::bool(closed));
        Value::Object(map)
    }

    #[test]
    fn test_render_escapes_variables() {
        let mut context = TemplateContext::new();
        context.set("name", Value::string("<script>alert('x')</script>"));

        assert_eq!(
            render("{{name}}", &context),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
        assert_eq!(render("{{{name}}}", &context), "<script>alert('x')</script>");
    }

    #[test]
    fn test_render_missing_variable() {
        let context = TemplateContext::new();
        assert_eq!(render("[{{missing}}]", &context), "[]");
    }

    #[test]
    fn test_render_if_else() {
        let mut context = TemplateContext::new();
        context.set("logged_in", Value::bool(false));
        assert_eq!(render("{{#if logged_in}}Hi{{else}}Login{{/if}}", &context), "Login");

        context.set("logged_in", Value::bool(true));
        assert_eq!(render("{{#if logged_in}}Hi{{else}}Login{{/if}}", &context), "Hi");
    }

    #[test]
    fn test_render_unless() {
        let mut context = TemplateContext::new();
        context.set("items", Value::list(vec![]));
        assert_eq!(render("{{#unless items}}Empty{{/unless}}", &context), "Empty");
    }

    #[test]
    fn test_render_each_objects() {
        let mut context = TemplateContext::new();
        context.set(
            "threads",
            Value::list(vec![thread("First", false), thread("<Second>", true)]),
        );

        let output = render(
            "{{#each threads}}{{@index}}={{title}}{{#if closed}}(closed){{/if}};{{/each}}",
            &context,
        );
        assert_eq!(output, "0=First;1=&lt;Second&gt;(closed);");
    }

    #[test]
    fn test_render_each_strings() {
        let mut context = TemplateContext::new();
        context.set("tags", vec!["rust", "web"].into());
        assert_eq!(
            render("{{#each tags}}{{#if @first}}{{else}}, {{/if}}{{this}}{{/each}}", &context),
            "rust, web"
        );
        assert_eq!(
            render("{{#each tags as tag}}[{{tag}}]{{/each}}", &context),
            "[rust][web]"
        );
    }

    #[test]
    fn test_render_each_not_list() {
        let mut context = TemplateContext::new();
        context.set("items", Value::number(3));
        let nodes = Parser::new("{{#each items}}x{{/each}}").parse().unwrap();
        assert!(matches!(
            Renderer::new(&context).render(&nodes),
            Err(TemplateError::Render(_))
        ));
    }

    #[test]
    fn test_render_with() {
        let mut context = TemplateContext::new();
        let mut stats = HashMap::new();
        stats.insert("users".to_string(), Value::number(3));
        context.set("stats", Value::Object(stats));

        assert_eq!(render("{{#with stats}}{{users}}{{/with}}", &context), "3");
        assert_eq!(render("{{stats.users}}", &context), "3");
    }
}
