//! MCP tools over the selected adapter.
//!
//! Every tool decodes its arguments, forwards to one adapter operation and
//! renders the outcome as a JSON object. Adapter errors are rendered too;
//! only unknown tools and undecodable arguments fail at this layer.

use crate::config::ServerConfig;
use ppt_mcp_core::{
    parse_id, AdapterKind, PowerPointAdapter, Rect, ResponseStyle, Result as AdapterResult,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use thiserror::Error;

/// A tool definition for the `tools/list` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Pretty-printed JSON payload. Payloads carrying an `error` key or
    /// `success: false` are flagged as errors.
    pub fn from_value(value: &Value) -> Self {
        let is_error =
            value.get("error").is_some() || value.get("success") == Some(&Value::Bool(false));
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![ToolContent::Text { text }],
            is_error,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }
}

/// Failures of the dispatch layer itself.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// A slide or shape ID, sent as a JSON number or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum IdArg {
    Number(i64),
    Text(String),
}

impl IdArg {
    fn raw(&self) -> String {
        match self {
            IdArg::Number(n) => n.to_string(),
            IdArg::Text(s) => s.clone(),
        }
    }

    fn number(&self) -> AdapterResult<i64> {
        match self {
            IdArg::Number(n) => Ok(*n),
            IdArg::Text(s) => parse_id(s),
        }
    }
}

#[derive(Deserialize)]
struct PathArgs {
    path: String,
}

#[derive(Deserialize)]
struct PresentationArgs {
    presentation_id: String,
}

#[derive(Deserialize)]
struct SaveArgs {
    presentation_id: String,
    #[serde(default)]
    path: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct CloseArgs {
    presentation_id: String,
    #[serde(default = "default_true")]
    save: bool,
}

fn default_layout() -> i32 {
    1
}

#[derive(Deserialize)]
struct AddSlideArgs {
    presentation_id: String,
    #[serde(default = "default_layout")]
    layout_type: i32,
}

#[derive(Deserialize)]
struct SlideArgs {
    presentation_id: String,
    slide_id: IdArg,
}

#[derive(Deserialize)]
struct UpdateTextArgs {
    presentation_id: String,
    slide_id: IdArg,
    shape_id: IdArg,
    text: String,
}

fn default_left() -> f64 {
    Rect::default().left
}

fn default_top() -> f64 {
    Rect::default().top
}

fn default_width() -> f64 {
    Rect::default().width
}

fn default_height() -> f64 {
    Rect::default().height
}

#[derive(Deserialize)]
struct TextBoxArgs {
    presentation_id: String,
    slide_id: IdArg,
    text: String,
    #[serde(default = "default_left")]
    left: f64,
    #[serde(default = "default_top")]
    top: f64,
    #[serde(default = "default_width")]
    width: f64,
    #[serde(default = "default_height")]
    height: f64,
}

#[derive(Deserialize)]
struct TitleArgs {
    presentation_id: String,
    slide_id: IdArg,
    title: String,
}

#[derive(Deserialize)]
struct SelectionArgs {
    #[serde(default)]
    presentation_id: Option<String>,
}

/// Reply of `initialize_powerpoint`.
#[derive(Debug, Serialize)]
struct InitializeOutcome {
    success: bool,
    platform: String,
    adapter_type: &'static str,
    message: &'static str,
}

/// Reply of `get_platform_info`.
#[derive(Debug, Serialize)]
pub struct PlatformInfo {
    pub platform: String,
    pub platform_release: String,
    /// Existing clients read the runtime description under this name.
    #[serde(rename = "python_version")]
    pub runtime_version: String,
    pub adapter_type: &'static str,
    pub adapter_available: bool,
}

/// Operating system name in the form clients expect (`Windows`, `Linux`,
/// `Darwin`).
pub fn platform_name() -> String {
    match std::env::consts::OS {
        "windows" => "Windows".to_string(),
        "linux" => "Linux".to_string(),
        "macos" => "Darwin".to_string(),
        other => other.to_string(),
    }
}

fn id_schema(description: &str) -> Value {
    json!({ "type": ["integer", "string"], "description": description })
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Every tool this server offers.
pub fn definitions() -> Vec<ToolDefinition> {
    let presentation_id = json!({ "type": "string", "description": "ID of the presentation" });
    let slide_id = id_schema("1-based slide number");

    vec![
        ToolDefinition {
            name: "initialize_powerpoint",
            description: "Initialize the PowerPoint backend and report which one is in use.",
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "get_presentations",
            description: "List open presentations with their IDs, paths and slide counts.",
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "open_presentation",
            description: "Open a presentation file (.pptx) and return its ID and metadata.",
            input_schema: object_schema(
                json!({ "path": { "type": "string", "description": "Full path to the file" } }),
                &["path"],
            ),
        },
        ToolDefinition {
            name: "create_presentation",
            description: "Create a new empty presentation and return its ID.",
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "save_presentation",
            description: "Save a presentation, to `path` if given, otherwise to its current file.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "path": { "type": "string", "description": "Target file path" },
                }),
                &["presentation_id"],
            ),
        },
        ToolDefinition {
            name: "close_presentation",
            description: "Close a presentation, saving pending changes first unless `save` is false.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "save": { "type": "boolean", "default": true },
                }),
                &["presentation_id"],
            ),
        },
        ToolDefinition {
            name: "get_slides",
            description: "List the slides of a presentation with titles and shape counts.",
            input_schema: object_schema(
                json!({ "presentation_id": presentation_id }),
                &["presentation_id"],
            ),
        },
        ToolDefinition {
            name: "add_slide",
            description: "Append a slide. Layouts: 1 title slide, 2 title and text, \
                          3 two columns, 7 blank.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "layout_type": { "type": "integer", "default": 1 },
                }),
                &["presentation_id"],
            ),
        },
        ToolDefinition {
            name: "get_slide_text",
            description: "Text of every shape on a slide, keyed by 1-based shape number.",
            input_schema: object_schema(
                json!({ "presentation_id": presentation_id, "slide_id": slide_id }),
                &["presentation_id", "slide_id"],
            ),
        },
        ToolDefinition {
            name: "update_text",
            description: "Replace the text of a shape.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "slide_id": slide_id,
                    "shape_id": id_schema("1-based shape number on the slide"),
                    "text": { "type": "string" },
                }),
                &["presentation_id", "slide_id", "shape_id", "text"],
            ),
        },
        ToolDefinition {
            name: "add_text_box",
            description: "Add a text box to a slide. Geometry is in points.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "slide_id": slide_id,
                    "text": { "type": "string" },
                    "left": { "type": "number", "default": 100 },
                    "top": { "type": "number", "default": 100 },
                    "width": { "type": "number", "default": 400 },
                    "height": { "type": "number", "default": 200 },
                }),
                &["presentation_id", "slide_id", "text"],
            ),
        },
        ToolDefinition {
            name: "set_slide_title",
            description: "Set the title of a slide, adding a title text box if it has no \
                          title placeholder.",
            input_schema: object_schema(
                json!({
                    "presentation_id": presentation_id,
                    "slide_id": slide_id,
                    "title": { "type": "string" },
                }),
                &["presentation_id", "slide_id", "title"],
            ),
        },
        ToolDefinition {
            name: "get_platform_info",
            description: "Report the host platform and the active PowerPoint backend.",
            input_schema: object_schema(json!({}), &[]),
        },
        ToolDefinition {
            name: "get_selected_shapes",
            description: "Shapes currently selected in the active PowerPoint window. A given \
                presentation_id must be the one shown there (live backend only).",
            input_schema: object_schema(
                json!({ "presentation_id": presentation_id }),
                &[],
            ),
        },
    ]
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn render<T: Serialize>(result: AdapterResult<T>, style: ResponseStyle) -> Value {
    match result {
        Ok(value) => {
            serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
        }
        Err(err) => {
            log::debug!("Tool call failed: {}", err);
            err.to_response(style)
        }
    }
}

/// Routes tool calls to the adapter this process selected.
pub struct ToolRouter {
    adapter: Box<dyn PowerPointAdapter>,
    config: ServerConfig,
}

impl ToolRouter {
    pub fn new(adapter: Box<dyn PowerPointAdapter>, config: ServerConfig) -> Self {
        Self { adapter, config }
    }

    pub fn adapter_kind(&self) -> AdapterKind {
        self.adapter.kind()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run a tool and wrap its payload for the `tools/call` response.
    pub fn call(&mut self, name: &str, arguments: Value) -> ToolCallResult {
        log::debug!("Calling tool {}", name);
        match self.dispatch(name, arguments) {
            Ok(value) => ToolCallResult::from_value(&value),
            Err(err) => {
                log::warn!("{}", err);
                ToolCallResult::error(err.to_string())
            }
        }
    }

    /// Run a tool and return its JSON payload.
    pub fn dispatch(&mut self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let adapter = self.adapter.as_mut();
        let value = match name {
            "initialize_powerpoint" => {
                let success = adapter.initialize();
                render(
                    Ok(InitializeOutcome {
                        success,
                        platform: platform_name(),
                        adapter_type: adapter.kind().type_name(),
                        message: if success {
                            "PowerPoint connection initialized"
                        } else {
                            "Failed to initialize PowerPoint"
                        },
                    }),
                    ResponseStyle::Plain,
                )
            }
            "get_presentations" => render(adapter.open_presentations(), ResponseStyle::Plain),
            "open_presentation" => {
                let args: PathArgs = decode(name, arguments)?;
                render(
                    adapter.open_presentation(Path::new(&args.path)),
                    ResponseStyle::Plain,
                )
            }
            "create_presentation" => render(adapter.create_presentation(), ResponseStyle::Plain),
            "save_presentation" => {
                let args: SaveArgs = decode(name, arguments)?;
                let target = args.path.as_deref().map(Path::new);
                render(
                    adapter.save_presentation(&args.presentation_id, target),
                    ResponseStyle::Outcome,
                )
            }
            "close_presentation" => {
                let args: CloseArgs = decode(name, arguments)?;
                render(
                    adapter
                        .close_presentation(&args.presentation_id, args.save)
                        .map(|()| json!({ "success": true })),
                    ResponseStyle::Outcome,
                )
            }
            "get_slides" => {
                let args: PresentationArgs = decode(name, arguments)?;
                render(adapter.slides(&args.presentation_id), ResponseStyle::Plain)
            }
            "add_slide" => {
                let args: AddSlideArgs = decode(name, arguments)?;
                render(
                    adapter.add_slide(&args.presentation_id, args.layout_type),
                    ResponseStyle::Plain,
                )
            }
            "get_slide_text" => {
                let args: SlideArgs = decode(name, arguments)?;
                let result = args
                    .slide_id
                    .number()
                    .and_then(|slide| adapter.slide_text(&args.presentation_id, slide));
                render(result, ResponseStyle::Plain)
            }
            "update_text" => {
                let args: UpdateTextArgs = decode(name, arguments)?;
                render(
                    adapter.update_text(
                        &args.presentation_id,
                        &args.slide_id.raw(),
                        &args.shape_id.raw(),
                        &args.text,
                    ),
                    ResponseStyle::Outcome,
                )
            }
            "add_text_box" => {
                let args: TextBoxArgs = decode(name, arguments)?;
                let rect = Rect::new(args.left, args.top, args.width, args.height);
                render(
                    adapter.add_text_box(
                        &args.presentation_id,
                        &args.slide_id.raw(),
                        &args.text,
                        rect,
                    ),
                    ResponseStyle::Plain,
                )
            }
            "set_slide_title" => {
                let args: TitleArgs = decode(name, arguments)?;
                let slide = args.slide_id.raw();
                render(
                    adapter.set_slide_title(&args.presentation_id, &slide, &args.title),
                    ResponseStyle::Plain,
                )
            }
            "get_platform_info" => render(Ok(self.platform_info()), ResponseStyle::Plain),
            "get_selected_shapes" => {
                let args: SelectionArgs = decode(name, arguments)?;
                render(
                    adapter.selected_shapes(args.presentation_id.as_deref()),
                    ResponseStyle::Plain,
                )
            }
            _ => return Err(ToolError::UnknownTool(name.to_string())),
        };
        Ok(value)
    }

    pub fn platform_info(&self) -> PlatformInfo {
        PlatformInfo {
            platform: platform_name(),
            platform_release: sysinfo::System::kernel_version().unwrap_or_default(),
            runtime_version: self.config.runtime_description(),
            adapter_type: self.adapter.kind().type_name(),
            adapter_available: self.adapter.is_available(),
        }
    }
}
