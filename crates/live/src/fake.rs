//! In-memory stand-in for the PowerPoint object model, used by tests.

use crate::dispatch::{AutomationError, AutomationResult, Connector, Dispatch, Variant};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

type Value = Variant<FakeObject>;

#[derive(Default)]
struct Node {
    kind: &'static str,
    props: HashMap<String, Value>,
    items: Vec<FakeObject>,
    failing: HashSet<String>,
    parent: Option<Weak<RefCell<Node>>>,
}

/// A scripted automation object.
#[derive(Clone)]
pub struct FakeObject(Rc<RefCell<Node>>);

impl fmt::Debug for FakeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeObject({})", self.0.borrow().kind)
    }
}

impl FakeObject {
    pub fn new(kind: &'static str) -> Self {
        Self(Rc::new(RefCell::new(Node {
            kind,
            ..Node::default()
        })))
    }

    pub fn with(self, name: &str, value: impl Into<Value>) -> Self {
        self.0.borrow_mut().props.insert(name.to_string(), value.into());
        self
    }

    pub fn with_object(self, name: &str, object: FakeObject) -> Self {
        self.with(name, Variant::Object(object))
    }

    /// Make a member raise an automation error.
    pub fn failing(self, name: &str) -> Self {
        self.0.borrow_mut().failing.insert(name.to_string());
        self
    }

    pub fn push(&self, item: FakeObject) {
        item.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        self.0.borrow_mut().items.push(item);
    }

    pub fn with_items(self, items: Vec<FakeObject>) -> Self {
        for item in items {
            self.push(item);
        }
        self
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.0.borrow().props.get(name).cloned()
    }

    pub fn prop_text(&self, name: &str) -> Option<String> {
        self.prop(name).and_then(Variant::into_text)
    }

    pub fn child(&self, name: &str) -> FakeObject {
        match self.prop(name).and_then(Variant::into_object) {
            Some(object) => object,
            None => panic!("no object property {name}"),
        }
    }

    pub fn item_count(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn item_at(&self, index: usize) -> FakeObject {
        self.0.borrow().items[index].clone()
    }

    fn kind(&self) -> &'static str {
        self.0.borrow().kind
    }

    fn check(&self, name: &str) -> AutomationResult<()> {
        if self.0.borrow().failing.contains(name) {
            return Err(AutomationError::call(name, "scripted failure"));
        }
        Ok(())
    }

    fn insert_item(&self, index: usize, item: FakeObject) {
        item.0.borrow_mut().parent = Some(Rc::downgrade(&self.0));
        let mut node = self.0.borrow_mut();
        let index = index.min(node.items.len());
        node.items.insert(index, item);
    }

    fn detach(&self) {
        let parent = self.0.borrow().parent.as_ref().and_then(Weak::upgrade);
        if let Some(parent) = parent {
            parent.borrow_mut().items.retain(|item| !Rc::ptr_eq(&item.0, &self.0));
        }
    }
}

fn int_arg(args: &[Value], index: usize) -> i64 {
    args.get(index).and_then(Variant::as_i64).unwrap_or(0)
}

fn float_arg(args: &[Value], index: usize) -> f64 {
    match args.get(index) {
        Some(Variant::Float(f)) => *f,
        Some(Variant::Int(i)) => *i as f64,
        _ => 0.0,
    }
}

impl Dispatch for FakeObject {
    fn get(&self, name: &str) -> AutomationResult<Value> {
        self.check(name)?;
        if name == "Count" {
            return Ok(Variant::Int(self.item_count() as i64));
        }
        if let Some(value) = self.prop(name) {
            return Ok(value);
        }
        // A text frame has text when its range is non-empty.
        if name == "HasText" && self.kind() == "TextFrame" {
            let text = self.child("TextRange").prop_text("Text").unwrap_or_default();
            return Ok(Variant::Bool(!text.is_empty()));
        }
        Err(AutomationError::call(name, "unknown member"))
    }

    fn put(&self, name: &str, value: Value) -> AutomationResult<()> {
        self.check(name)?;
        self.0.borrow_mut().props.insert(name.to_string(), value);
        Ok(())
    }

    fn call(&self, name: &str, args: &[Value]) -> AutomationResult<Value> {
        self.check(name)?;
        let object = match (self.kind(), name) {
            (_, "Item") => {
                let index = int_arg(args, 0);
                let node = self.0.borrow();
                usize::try_from(index - 1)
                    .ok()
                    .and_then(|i| node.items.get(i).cloned())
                    .ok_or_else(|| AutomationError::call("Item", "index out of range"))?
            }
            ("Presentations", "Add") => {
                let presentation = presentation("Presentation1", Vec::new()).with("Saved", false);
                self.push(presentation.clone());
                presentation
            }
            ("Presentations", "Open") => {
                let path = args.first().cloned().and_then(Variant::into_text).unwrap_or_default();
                let presentation = presentation(&path, Vec::new());
                self.push(presentation.clone());
                presentation
            }
            ("Presentation", "Save") => {
                self.put("Saved", Variant::Bool(true))?;
                return Ok(Variant::Empty);
            }
            ("Presentation", "SaveAs") => {
                let path = args.first().cloned().and_then(Variant::into_text).unwrap_or_default();
                self.put("FullName", Variant::Text(path))?;
                self.put("Saved", Variant::Bool(true))?;
                return Ok(Variant::Empty);
            }
            ("Presentation", "Close") => {
                self.detach();
                return Ok(Variant::Empty);
            }
            ("Slides", "Add") => {
                let index = int_arg(args, 0);
                let layout = int_arg(args, 1);
                // ppLayoutBlank is 12; everything else gets title and body.
                let shapes = if layout == 12 {
                    Vec::new()
                } else {
                    vec![placeholder("Title 1", 1, ""), placeholder("Content Placeholder 2", 2, "")]
                };
                let slide = slide(shapes);
                self.insert_item((index - 1).max(0) as usize, slide.clone());
                slide
            }
            ("Shapes", "AddTextbox") => {
                let name = format!("TextBox {}", self.item_count() + 1);
                let shape = text_shape(&name, 17, "")
                    .with("Left", float_arg(args, 1))
                    .with("Top", float_arg(args, 2))
                    .with("Width", float_arg(args, 3))
                    .with("Height", float_arg(args, 4));
                self.push(shape.clone());
                shape
            }
            _ => return Err(AutomationError::call(name, "unknown method")),
        };
        Ok(Variant::Object(object))
    }

    fn is_same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// `Application` with an empty `Presentations` collection.
pub fn application() -> FakeObject {
    FakeObject::new("Application")
        .with("Visible", false)
        .with_object("Presentations", FakeObject::new("Presentations"))
}

pub fn presentation(full_name: &str, slides: Vec<FakeObject>) -> FakeObject {
    FakeObject::new("Presentation")
        .with("FullName", full_name)
        .with("Saved", true)
        .with_object("Slides", FakeObject::new("Slides").with_items(slides))
}

pub fn slide(shapes: Vec<FakeObject>) -> FakeObject {
    FakeObject::new("Slide")
        .with("SlideIndex", 1_i64)
        .with_object("Shapes", FakeObject::new("Shapes").with_items(shapes))
}

fn text_frame(range: &FakeObject) -> FakeObject {
    FakeObject::new("TextFrame").with_object("TextRange", range.clone())
}

/// A shape whose legacy and modern text frames share one text range.
pub fn text_shape(name: &str, shape_type: i64, text: &str) -> FakeObject {
    let range = FakeObject::new("TextRange")
        .with("Text", text)
        .with_object("Font", FakeObject::new("Font"));
    FakeObject::new("Shape")
        .with("Name", name)
        .with("Type", shape_type)
        .with_object("TextFrame", text_frame(&range))
        .with_object("TextFrame2", text_frame(&range))
}

/// A placeholder; `ph_type` is a `PpPlaceholderType` (1 = title).
pub fn placeholder(name: &str, ph_type: i64, text: &str) -> FakeObject {
    text_shape(name, 14, text).with_object(
        "PlaceholderFormat",
        FakeObject::new("PlaceholderFormat").with("Type", ph_type),
    )
}

/// A shape without any text frame.
pub fn picture(name: &str) -> FakeObject {
    FakeObject::new("Shape")
        .with("Name", name)
        .with("Type", 13_i64)
        .failing("TextFrame")
        .failing("TextFrame2")
}

pub fn group(name: &str, members: Vec<FakeObject>) -> FakeObject {
    FakeObject::new("Shape")
        .with("Name", name)
        .with("Type", 6_i64)
        .failing("TextFrame")
        .failing("TextFrame2")
        .with_object("GroupItems", FakeObject::new("GroupItems").with_items(members))
}

/// Connector handing out scripted application objects.
#[derive(Default)]
pub struct FakeConnector {
    pub available: bool,
    pub running: Option<FakeObject>,
    pub launchable: Option<FakeObject>,
}

impl FakeConnector {
    /// Available, with `app` already running.
    pub fn running(app: FakeObject) -> Self {
        Self {
            available: true,
            running: Some(app),
            launchable: None,
        }
    }
}

impl Connector for FakeConnector {
    type Object = FakeObject;

    fn is_available(&self) -> bool {
        self.available
    }

    fn attach(&self) -> AutomationResult<FakeObject> {
        self.running
            .clone()
            .ok_or_else(|| AutomationError::call("GetActiveObject", "operation unavailable"))
    }

    fn launch(&self) -> AutomationResult<FakeObject> {
        self.launchable
            .clone()
            .ok_or_else(|| AutomationError::call("CoCreateInstance", "class not registered"))
    }
}
