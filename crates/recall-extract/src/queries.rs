//! Per-language tree-sitter queries for the declaration/import/call shapes
//! §4.4 asks for. Grounded on the upstream C parser's query-per-concern
//! split (`drift-core::parsers::c::CParser`), generalized across grammars.

use tree_sitter::Query;

use crate::error::{ExtractError, Result};
use crate::language::Language;

pub struct GrammarQueries {
    pub function: Query,
    pub class: Query,
    pub call: Query,
    pub import: Query,
    pub import_from: Option<Query>,
    pub export: Option<Query>,
}

fn build(language: Language, source: &str) -> Result<Query> {
    Query::new(&language.grammar(), source).map_err(|e| ExtractError::GrammarSetup {
        language: language.name().to_string(),
        message: e.to_string(),
    })
}

pub fn build_for(language: Language) -> Result<GrammarQueries> {
    match language {
        Language::TypeScript | Language::Tsx | Language::JavaScript => Ok(GrammarQueries {
            function: build(
                language,
                r#"
                (function_declaration name: (identifier) @name) @function
                (method_definition name: (property_identifier) @name) @method
                (variable_declarator
                    name: (identifier) @name
                    value: [(arrow_function) (function_expression)]) @function
                "#,
            )?,
            class: build(
                language,
                r#"
                (class_declaration name: (_) @name) @class
                (interface_declaration name: (type_identifier) @name) @interface
                (enum_declaration name: (identifier) @name) @enum
                (type_alias_declaration name: (type_identifier) @name) @type_alias
                "#,
            )?,
            call: build(
                language,
                r#"
                (call_expression function: (identifier) @callee) @call
                (call_expression function: (member_expression property: (property_identifier) @callee)) @call
                "#,
            )?,
            import: build(
                language,
                r#"(import_statement source: (string) @module) @import"#,
            )?,
            import_from: Some(build(
                language,
                r#"
                (import_statement
                    (import_clause (named_imports (import_specifier name: (identifier) @symbol)))
                    source: (string) @module) @import_from
                "#,
            )?),
            export: Some(build(language, r#"(export_statement declaration: (_) @declaration) @export"#)?),
        }),
        Language::Python => Ok(GrammarQueries {
            function: build(language, r#"(function_definition name: (identifier) @name) @function"#)?,
            class: build(language, r#"(class_definition name: (identifier) @name) @class"#)?,
            call: build(
                language,
                r#"
                (call function: (identifier) @callee) @call
                (call function: (attribute attribute: (identifier) @callee)) @call
                "#,
            )?,
            import: build(language, r#"(import_statement name: (dotted_name) @module) @import"#)?,
            import_from: Some(build(
                language,
                r#"
                (import_from_statement
                    module_name: (dotted_name) @module
                    name: (dotted_name) @symbol) @import_from
                "#,
            )?),
            export: None,
        }),
        Language::Java => Ok(GrammarQueries {
            function: build(language, r#"(method_declaration name: (identifier) @name) @method"#)?,
            class: build(
                language,
                r#"
                (class_declaration name: (identifier) @name) @class
                (interface_declaration name: (identifier) @name) @interface
                (enum_declaration name: (identifier) @name) @enum
                "#,
            )?,
            call: build(
                language,
                r#"
                (method_invocation name: (identifier) @callee) @call
                (object_creation_expression type: (type_identifier) @callee) @call
                "#,
            )?,
            import: build(language, r#"(import_declaration (scoped_identifier) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
        Language::CSharp => Ok(GrammarQueries {
            function: build(language, r#"(method_declaration name: (identifier) @name) @method"#)?,
            class: build(
                language,
                r#"
                (class_declaration name: (identifier) @name) @class
                (interface_declaration name: (identifier) @name) @interface
                (enum_declaration name: (identifier) @name) @enum
                "#,
            )?,
            call: build(
                language,
                r#"
                (invocation_expression function: (identifier) @callee) @call
                (invocation_expression function: (member_access_expression name: (identifier) @callee)) @call
                "#,
            )?,
            import: build(language, r#"(using_directive (qualified_name) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
        Language::Go => Ok(GrammarQueries {
            function: build(
                language,
                r#"
                (function_declaration name: (identifier) @name) @function
                (method_declaration name: (field_identifier) @name) @method
                "#,
            )?,
            class: build(language, r#"(type_declaration (type_spec name: (type_identifier) @name)) @class"#)?,
            call: build(
                language,
                r#"
                (call_expression function: (identifier) @callee) @call
                (call_expression function: (selector_expression field: (field_identifier) @callee)) @call
                "#,
            )?,
            import: build(language, r#"(import_spec path: (interpreted_string_literal) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
        Language::Rust => Ok(GrammarQueries {
            function: build(language, r#"(function_item name: (identifier) @name) @function"#)?,
            class: build(
                language,
                r#"
                (struct_item name: (type_identifier) @name) @class
                (enum_item name: (type_identifier) @name) @enum
                (trait_item name: (type_identifier) @name) @interface
                (type_item name: (type_identifier) @name) @type_alias
                "#,
            )?,
            call: build(
                language,
                r#"
                (call_expression function: (identifier) @callee) @call
                (call_expression function: (field_expression field: (field_identifier) @callee)) @call
                "#,
            )?,
            import: build(language, r#"(use_declaration argument: (_) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
        Language::Ruby => Ok(GrammarQueries {
            function: build(language, r#"(method name: (identifier) @name) @function"#)?,
            class: build(
                language,
                r#"
                (class name: (constant) @name) @class
                (module name: (constant) @name) @class
                "#,
            )?,
            call: build(language, r#"(call method: (identifier) @callee) @call"#)?,
            import: build(
                language,
                r#"
                (call
                    method: (identifier) @require_kind
                    arguments: (argument_list (string (string_content) @module))
                    (#match? @require_kind "^require")) @import
                "#,
            )?,
            import_from: None,
            export: None,
        }),
        Language::Php => Ok(GrammarQueries {
            function: build(language, r#"(function_definition name: (name) @name) @function"#)?,
            class: build(
                language,
                r#"
                (class_declaration name: (name) @name) @class
                (interface_declaration name: (name) @name) @interface
                (enum_declaration name: (name) @name) @enum
                "#,
            )?,
            call: build(
                language,
                r#"
                (function_call_expression function: (name) @callee) @call
                (member_call_expression name: (name) @callee) @call
                "#,
            )?,
            import: build(language, r#"(namespace_use_clause (qualified_name) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
        Language::Kotlin => Ok(GrammarQueries {
            function: build(language, r#"(function_declaration (simple_identifier) @name) @function"#)?,
            class: build(language, r#"(class_declaration (type_identifier) @name) @class"#)?,
            call: build(language, r#"(call_expression (simple_identifier) @callee) @call"#)?,
            import: build(language, r#"(import_header (identifier) @module) @import"#)?,
            import_from: None,
            export: None,
        }),
    }
}
