//! Semantic color categories.
//!
//! Every token a grammar colors is tagged with a `ColorKey`. Themes map
//! keys to colors; a key the theme leaves unset borrows the color of its
//! fallback key. The fallback graph is a forest: every chain ends at
//! `Custom` (which has a hard default) or at a key without a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! color_keys {
    ($($(#[$doc:meta])* $variant:ident => $raw:literal,)*) => {
        /// A semantic token role used to look up a themed color.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum ColorKey {
            $($(#[$doc])* #[serde(rename = $raw)] $variant,)*
        }

        impl ColorKey {
            /// Every key, in declaration order. `key.index()` is the
            /// position of `key` in this slice.
            pub const ALL: &'static [ColorKey] = &[$(ColorKey::$variant,)*];

            /// The raw value used in grammar documents and store keys.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ColorKey::$variant => $raw,)*
                }
            }
        }

        impl FromStr for ColorKey {
            type Err = UnknownColorKey;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($raw => Ok(ColorKey::$variant),)*
                    _ => Err(UnknownColorKey(s.to_string())),
                }
            }
        }
    };
}

color_keys! {
    PlainText => "plain_text",
    Background => "background",

    LineNumber => "line_number",
    LineNumberBackground => "line_number_background",

    Keyword => "keyword",
    ControlCharacter => "control_character",
    Operator => "operator",
    Annotation => "annotation",

    Type => "type",
    TypeDeclaration => "type_declaration",
    Generics => "generics",

    Variable => "variable",
    Constant => "constant",

    InstanceVariable => "instance_variable",
    InstanceVariableDeclaration => "instance_variable_declaration",

    StaticVariable => "static_variable",
    StaticVariableDeclaration => "static_variable_declaration",

    GlobalVariable => "global_variable",
    GlobalVariableDeclaration => "global_variable_declaration",

    Attribute => "attribute",

    FunctionCall => "function_call",
    FunctionDeclaration => "function_declaration",

    StaticFunctionCall => "static_function_call",
    StaticFunctionDeclaration => "static_function_declaration",

    GlobalFunctionCall => "global_function_call",
    GlobalFunctionDeclaration => "global_function_declaration",

    String => "string",
    StringEscapeSequence => "string_escape_sequence",
    StringFormatSequence => "string_format_sequence",

    Character => "character",
    CharacterEscapeSequence => "character_escape_sequence",

    Number => "number",

    Hyperlink => "hyperlink",

    Comment => "comment",
    CommentTag => "comment_tag",
    MultilineComment => "multiline_comment",
    DocumentationComment => "documentation_comment",
    MultilineDocumentationComment => "multiline_documentation_comment",
    DocumentationCommentParameter => "documentation_comment_parameter",
    DocumentationCommentValue => "documentation_comment_value",

    Class => "class",
    Identifier => "identifier",
    Label => "label",
    Selector => "selector",

    /// Terminal key. Resolves to white when no theme sets it, and a rule
    /// tagged with it uses its own direct color.
    Custom => "custom",
}

impl ColorKey {
    pub const COUNT: usize = Self::ALL.len();

    /// Position of this key in `ColorKey::ALL`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The key whose color is borrowed when this one is unset.
    pub fn fallback(self) -> Option<ColorKey> {
        use ColorKey::*;

        match self {
            Custom => None,
            PlainText | Background => Some(Custom),
            LineNumberBackground => Some(Background),
            Class => Some(Type),
            CommentTag | MultilineComment => Some(Comment),
            MultilineDocumentationComment
            | DocumentationCommentParameter
            | DocumentationCommentValue => Some(DocumentationComment),
            CharacterEscapeSequence => Some(Character),
            StringFormatSequence | StringEscapeSequence => Some(String),
            _ => Some(PlainText),
        }
    }

    /// Number of fallback hops from this key to the end of its chain, or
    /// `None` if the chain revisits a key.
    pub fn fallback_depth(self) -> Option<usize> {
        let mut seen = [false; Self::COUNT];
        let mut current = self;
        let mut depth = 0;

        while let Some(next) = current.fallback() {
            if std::mem::replace(&mut seen[current.index()], true) {
                return None;
            }
            current = next;
            depth += 1;
        }
        Some(depth)
    }
}

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a raw value that names no key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color key: {0}")]
pub struct UnknownColorKey(pub std::string::String);
