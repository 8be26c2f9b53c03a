//! `__NAME__` placeholder templates.
//!
//! A template is a static string such as `__HOST__/rtv/__VERSION__/v0.css`.
//! Its variable set decides what each token expands to. Tokens the set does
//! not know are left in the output unchanged.

use std::marker::PhantomData;

/// Values for the tokens of one template family.
pub trait TemplateVars {
    /// Replacement for `__{name}__`, or `None` to keep the token.
    fn lookup(&self, name: &str) -> Option<&str>;
}

/// A static template bound to its variable set `V`.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _vars: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _vars: PhantomData,
        }
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        let mut out = String::with_capacity(self.content.len() + 32);
        let mut rest = self.content;
        while let Some(start) = rest.find("__") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("__") else {
                break;
            };
            out.push_str(&rest[..start]);
            match vars.lookup(&after[..end]) {
                Some(value) => out.push_str(value),
                None => out.push_str(&rest[start..start + end + 4]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Vars;

    impl TemplateVars for Vars {
        fn lookup(&self, name: &str) -> Option<&str> {
            (name == "A").then_some("x")
        }
    }

    #[test]
    fn test_render_tokens() {
        assert_eq!(Template::<Vars>::new("__A__/__A__").render(&Vars), "x/x");
        assert_eq!(Template::<Vars>::new("a__B__b__A__").render(&Vars), "a__B__bx");
        assert_eq!(Template::<Vars>::new("no tokens").render(&Vars), "no tokens");
        assert_eq!(Template::<Vars>::new("half__A").render(&Vars), "half__A");
    }
}
