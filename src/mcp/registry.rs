//! Tool registry: typed handlers behind one uniform invocation interface.
//!
//! Handlers are registered with a concrete input type. At registration time
//! the input type is introspected into a wire-level [`InputSchema`], and the
//! handler is wrapped into a uniform closure that decodes untyped arguments,
//! invokes the typed function, and returns a [`CallToolResult`]. Tool names
//! are unique keys; registering a name twice replaces the previous entry.
//!
//! The registry holds no locks: a session owns exactly one registry, and all
//! registration happens before the server loop starts.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::RegistryError;
use crate::mcp::types::{CallToolResult, InputSchema, Tool};

/// Uniform invocation signature every registered handler is wrapped into.
type BoxedHandler = Box<dyn Fn(Value) -> Result<CallToolResult, RegistryError> + Send + Sync>;

struct RegisteredTool {
    descriptor: Tool,
    handler: BoxedHandler,
}

/// Maps tool names to schema-described, uniformly callable handlers.
///
/// Iteration order of the underlying map is lexicographic by tool name,
/// which is the listing order guaranteed by [`ToolRegistry::list`].
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool whose handler builds its own [`CallToolResult`].
    ///
    /// The input schema is derived from `I` once, here. Registering a name
    /// that already exists silently replaces the previous entry.
    pub fn register<I, F>(&mut self, name: impl Into<String>, description: impl Into<String>, handler: F)
    where
        I: DeserializeOwned + JsonSchema,
        F: Fn(I) -> CallToolResult + Send + Sync + 'static,
    {
        let name = name.into();
        let handler_name = name.clone();
        let boxed: BoxedHandler = Box::new(move |args| {
            let input: I = decode_arguments(&handler_name, args)?;
            Ok(handler(input))
        });
        self.insert(name, description.into(), derive_input_schema::<I>(), boxed);
    }

    /// Registers a tool whose handler returns an arbitrary serialisable value.
    ///
    /// The output is serialised to JSON text and wrapped into a single text
    /// content item with the error flag cleared.
    pub fn register_json<I, O, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) where
        I: DeserializeOwned + JsonSchema,
        O: Serialize,
        F: Fn(I) -> O + Send + Sync + 'static,
    {
        let name = name.into();
        let handler_name = name.clone();
        let boxed: BoxedHandler = Box::new(move |args| {
            let input: I = decode_arguments(&handler_name, args)?;
            let output = handler(input);
            Ok(match serde_json::to_string(&output) {
                Ok(text) => CallToolResult::text(text),
                Err(e) => CallToolResult::error(format!("Failed to serialise tool output: {e}")),
            })
        });
        self.insert(name, description.into(), derive_input_schema::<I>(), boxed);
    }

    fn insert(
        &mut self,
        name: String,
        description: String,
        input_schema: InputSchema,
        handler: BoxedHandler,
    ) {
        let descriptor = Tool {
            name: name.clone(),
            description: (!description.is_empty()).then_some(description),
            input_schema,
        };

        let previous = self.tools.insert(
            name.clone(),
            RegisteredTool {
                descriptor,
                handler,
            },
        );
        if previous.is_some() {
            tracing::debug!(tool = %name, "Replaced existing tool registration");
        } else {
            tracing::debug!(tool = %name, "Registered tool");
        }
    }

    /// Invokes a tool by name with untyped arguments.
    ///
    /// Missing arguments decode as an empty object, so tools whose fields
    /// are all optional can be called bare.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ToolNotFound`] when no tool has this name,
    /// or [`RegistryError::InvalidArguments`] when the arguments do not
    /// match the handler's input type.
    pub fn call(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult, RegistryError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))?;

        let args = arguments.unwrap_or_else(|| Value::Object(Map::new()));
        (tool.handler)(args)
    }

    /// Returns all tool descriptors, sorted lexicographically by name.
    #[must_use]
    pub fn list(&self) -> Vec<Tool> {
        self.tools
            .values()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn decode_arguments<I: DeserializeOwned>(name: &str, args: Value) -> Result<I, RegistryError> {
    serde_json::from_value(args).map_err(|e| RegistryError::InvalidArguments {
        name: name.to_string(),
        source: e,
    })
}

/// Derives the wire-level input schema from a handler's input type.
///
/// A pure, deterministic function of `I`'s shape: the generated JSON Schema
/// is flattened (a root-level `$ref` is resolved against its definitions)
/// and reduced to the `type`/`properties`/`required` triple the protocol
/// exposes.
#[must_use]
pub fn derive_input_schema<I: JsonSchema>() -> InputSchema {
    let root = serde_json::to_value(schemars::schema_for!(I)).unwrap_or(Value::Null);

    let Some(obj) = flattened_schema_object(&root) else {
        return InputSchema::default();
    };

    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let required = obj.get("required").and_then(Value::as_array).map(|names| {
        names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    });

    InputSchema {
        schema_type: "object".to_string(),
        properties,
        required,
    }
}

/// Resolves a root-level `$ref` against the schema's own definitions.
fn flattened_schema_object(root: &Value) -> Option<&Map<String, Value>> {
    let obj = root.as_object()?;

    let Some(reference) = obj.get("$ref").and_then(Value::as_str) else {
        return Some(obj);
    };

    let name = reference.rsplit('/').next()?;
    obj.get("$defs")
        .or_else(|| obj.get("definitions"))?
        .as_object()?
        .get(name)?
        .as_object()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct AddInput {
        a: i64,
        b: i64,
    }

    #[derive(Debug, Deserialize, JsonSchema)]
    struct GreetInput {
        name: String,
        #[serde(default)]
        greeting: Option<String>,
    }

    #[derive(Debug, Serialize)]
    struct MulOutput {
        product: i64,
    }

    fn sum_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register("add", "Add two integers", |input: AddInput| {
            CallToolResult::text(json!({"sum": input.a + input.b}).to_string())
        });
        registry
    }

    fn result_text(result: &CallToolResult) -> &str {
        match &result.content[..] {
            [crate::mcp::types::Content::Text { text }] => text,
            other => panic!("expected single text content, got {other:?}"),
        }
    }

    #[test]
    fn derive_schema_for_plain_struct() {
        let schema = derive_input_schema::<AddInput>();
        assert_eq!(schema.schema_type, "object");
        assert_eq!(
            schema.properties.get("a").and_then(|p| p.get("type")),
            Some(&json!("integer"))
        );
        assert_eq!(
            schema.properties.get("b").and_then(|p| p.get("type")),
            Some(&json!("integer"))
        );

        let required = schema.required.unwrap();
        assert!(required.contains(&"a".to_string()));
        assert!(required.contains(&"b".to_string()));
    }

    #[test]
    fn derive_schema_optional_field_not_required() {
        let schema = derive_input_schema::<GreetInput>();
        assert!(schema.properties.contains_key("name"));
        assert!(schema.properties.contains_key("greeting"));

        let required = schema.required.unwrap_or_default();
        assert!(required.contains(&"name".to_string()));
        assert!(!required.contains(&"greeting".to_string()));
    }

    #[test]
    fn derive_schema_is_deterministic() {
        assert_eq!(
            derive_input_schema::<AddInput>(),
            derive_input_schema::<AddInput>()
        );
    }

    #[test]
    fn call_round_trip() {
        let registry = sum_registry();
        let result = registry.call("add", Some(json!({"a": 2, "b": 3}))).unwrap();
        assert!(result_text(&result).contains(r#""sum":5"#));
        assert_eq!(result.is_error, Some(false));
    }

    #[test]
    fn call_unknown_tool() {
        let registry = sum_registry();
        let err = registry.call("subtract", None).unwrap_err();
        assert!(matches!(err, RegistryError::ToolNotFound(_)));
        assert!(err.to_string().contains("subtract"));
    }

    #[test]
    fn call_with_mismatched_arguments() {
        let registry = sum_registry();
        let err = registry
            .call("add", Some(json!({"a": "two", "b": 3})))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArguments { .. }));
        assert!(err.to_string().contains("add"));
    }

    #[test]
    fn call_with_missing_arguments_decodes_empty_object() {
        #[derive(Deserialize, JsonSchema)]
        struct NoArgs {}

        let mut registry = ToolRegistry::new();
        registry.register("status", "", |_: NoArgs| CallToolResult::text("ok"));

        let result = registry.call("status", None).unwrap();
        assert_eq!(result_text(&result), "ok");
    }

    #[test]
    fn register_json_wraps_output_as_text() {
        let mut registry = ToolRegistry::new();
        registry.register_json("multiply", "Multiply two integers", |input: AddInput| {
            MulOutput {
                product: input.a * input.b,
            }
        });

        let result = registry
            .call("multiply", Some(json!({"a": 6, "b": 7})))
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(result_text(&result).contains(r#""product":42"#));
    }

    #[test]
    fn list_is_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register("zeta", "", |_: AddInput| CallToolResult::text(""));
        registry.register("alpha", "", |_: AddInput| CallToolResult::text(""));
        registry.register("mango", "", |_: AddInput| CallToolResult::text(""));

        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "mango", "zeta"]);
    }

    #[test]
    fn list_is_stable() {
        let registry = sum_registry();
        assert_eq!(registry.list(), registry.list());
    }

    #[test]
    fn duplicate_registration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register("add", "first", |_: AddInput| CallToolResult::text("first"));
        registry.register("add", "second", |_: AddInput| CallToolResult::text("second"));

        assert_eq!(registry.len(), 1);
        let result = registry.call("add", Some(json!({"a": 0, "b": 0}))).unwrap();
        assert_eq!(result_text(&result), "second");
        assert_eq!(
            registry.list()[0].description.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn descriptor_carries_derived_schema() {
        let registry = sum_registry();
        let tools = registry.list();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "add");
        assert_eq!(tools[0].input_schema, derive_input_schema::<AddInput>());
    }

    #[test]
    fn empty_description_omitted() {
        let mut registry = ToolRegistry::new();
        registry.register("bare", "", |_: AddInput| CallToolResult::text(""));
        assert!(registry.list()[0].description.is_none());
    }

    #[test]
    fn empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.list().is_empty());
    }
}
