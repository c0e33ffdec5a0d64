//! Late-bound automation objects.
//!
//! PowerPoint's object model is reached through `IDispatch`: members are
//! looked up by name at runtime and every value travels as a variant. The
//! [`Dispatch`] trait captures exactly that surface so the adapter logic is
//! independent of COM itself.

use thiserror::Error;

/// A value passed to or returned from an automation member.
#[derive(Debug, Clone)]
pub enum Variant<O> {
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(O),
}

impl<O> Variant<O> {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            // MsoTriState: msoTrue is -1.
            Variant::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            Variant::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Variant::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Variant::Text(s) => Some(s),
            Variant::Empty => Some(String::new()),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<O> {
        match self {
            Variant::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl<O> From<&str> for Variant<O> {
    fn from(value: &str) -> Self {
        Variant::Text(value.to_string())
    }
}

impl<O> From<bool> for Variant<O> {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl<O> From<i64> for Variant<O> {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl<O> From<f64> for Variant<O> {
    fn from(value: f64) -> Self {
        Variant::Float(value)
    }
}

/// Errors raised by the automation layer.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// COM or the PowerPoint class is not present on this host.
    #[error("COM automation is not available on this host")]
    NotAvailable,

    /// The member call itself failed.
    #[error("{member} failed: {message}")]
    Call { member: String, message: String },

    /// The member returned a value of the wrong kind.
    #[error("{member} did not return {expected}")]
    UnexpectedType {
        member: String,
        expected: &'static str,
    },
}

impl AutomationError {
    pub fn call(member: &str, message: impl Into<String>) -> Self {
        Self::Call {
            member: member.to_string(),
            message: message.into(),
        }
    }

    fn unexpected(member: &str, expected: &'static str) -> Self {
        Self::UnexpectedType {
            member: member.to_string(),
            expected,
        }
    }
}

impl From<AutomationError> for ppt_mcp_core::Error {
    fn from(err: AutomationError) -> Self {
        ppt_mcp_core::Error::Automation(err.to_string())
    }
}

/// Result type for automation calls.
pub type AutomationResult<T> = std::result::Result<T, AutomationError>;

/// An automation object whose members are resolved by name.
pub trait Dispatch: Clone + Sized {
    /// Read a property.
    fn get(&self, name: &str) -> AutomationResult<Variant<Self>>;

    /// Write a property.
    fn put(&self, name: &str, value: Variant<Self>) -> AutomationResult<()>;

    /// Invoke a method.
    fn call(&self, name: &str, args: &[Variant<Self>]) -> AutomationResult<Variant<Self>>;

    /// Whether both wrappers point at the same underlying object.
    fn is_same(&self, other: &Self) -> bool;
}

/// Typed accessors on top of [`Dispatch`].
pub trait DispatchExt: Dispatch {
    /// A property holding an object.
    fn object(&self, name: &str) -> AutomationResult<Self> {
        self.get(name)?
            .into_object()
            .ok_or_else(|| AutomationError::unexpected(name, "an object"))
    }

    /// Follow a chain of object properties (`TextFrame.TextRange`).
    fn path(&self, names: &[&str]) -> AutomationResult<Self> {
        names
            .iter()
            .try_fold(self.clone(), |current, name| current.object(name))
    }

    fn int(&self, name: &str) -> AutomationResult<i64> {
        self.get(name)?
            .as_i64()
            .ok_or_else(|| AutomationError::unexpected(name, "an integer"))
    }

    fn flag(&self, name: &str) -> AutomationResult<bool> {
        self.get(name)?
            .as_bool()
            .ok_or_else(|| AutomationError::unexpected(name, "a boolean"))
    }

    fn text(&self, name: &str) -> AutomationResult<String> {
        self.get(name)?
            .into_text()
            .ok_or_else(|| AutomationError::unexpected(name, "a string"))
    }

    /// `Count` of a collection.
    fn count(&self) -> AutomationResult<usize> {
        let count = self.int("Count")?;
        usize::try_from(count).map_err(|_| AutomationError::unexpected("Count", "a count"))
    }

    /// 1-based `Item(index)` of a collection.
    fn item(&self, index: usize) -> AutomationResult<Self> {
        self.call("Item", &[Variant::Int(index as i64)])?
            .into_object()
            .ok_or_else(|| AutomationError::unexpected("Item", "an object"))
    }

    /// Every member of a collection, in order.
    fn items(&self) -> AutomationResult<Vec<Self>> {
        (1..=self.count()?).map(|i| self.item(i)).collect()
    }

    /// Invoke a method that returns an object.
    fn call_object(&self, name: &str, args: &[Variant<Self>]) -> AutomationResult<Self> {
        self.call(name, args)?
            .into_object()
            .ok_or_else(|| AutomationError::unexpected(name, "an object"))
    }
}

impl<D: Dispatch> DispatchExt for D {}

/// Obtains the `PowerPoint.Application` object.
pub trait Connector {
    type Object: Dispatch;

    /// Whether automation can be attempted at all on this host.
    fn is_available(&self) -> bool;

    /// Attach to an already running application.
    fn attach(&self) -> AutomationResult<Self::Object>;

    /// Start a new application instance.
    fn launch(&self) -> AutomationResult<Self::Object>;
}

#[cfg(test)]
mod tests {
    use super::*;

    type V = Variant<()>;

    #[test]
    fn test_tristate_reads_as_bool() {
        assert_eq!(V::Int(-1).as_bool(), Some(true));
        assert_eq!(V::Int(0).as_bool(), Some(false));
        assert_eq!(V::Bool(true).as_bool(), Some(true));
        assert_eq!(V::Text("x".into()).as_bool(), None);
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(V::Float(14.0).as_i64(), Some(14));
        assert_eq!(V::Float(14.5).as_i64(), None);
        assert_eq!(V::Empty.into_text().as_deref(), Some(""));
    }

    #[test]
    fn test_automation_error_becomes_core_error() {
        let err: ppt_mcp_core::Error = AutomationError::call("Slides.Add", "boom").into();
        assert_eq!(err.to_string(), "Automation error: Slides.Add failed: boom");
    }
}
