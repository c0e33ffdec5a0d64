//! Slide title resolution.
//!
//! A slide has no single title field in either object model. The title is
//! found by trying an ordered list of strategies over the slide's shapes;
//! the first strategy that yields non-blank text wins.

use crate::types::UNTITLED_SLIDE;

/// What title resolution needs to know about a shape.
///
/// Implementations swallow backend failures: a shape that cannot answer a
/// question simply does not match.
pub trait TitleCandidate {
    /// The shape is the slide's title (or centered title) placeholder.
    fn is_title_placeholder(&self) -> bool;

    /// The shape is a free-floating text box.
    fn is_text_box(&self) -> bool;

    /// The shape's text, if it has a readable text frame.
    fn text(&self) -> Option<String>;
}

type Strategy<S> = fn(&[S]) -> Option<String>;

/// Resolve the title of a slide from its shapes.
pub fn resolve_title<S: TitleCandidate>(shapes: &[S]) -> String {
    let strategies: [Strategy<S>; 3] = [
        from_title_placeholder::<S>,
        from_text_box::<S>,
        from_any_text::<S>,
    ];
    strategies
        .iter()
        .find_map(|strategy| strategy(shapes))
        .unwrap_or_else(|| UNTITLED_SLIDE.to_string())
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

fn from_title_placeholder<S: TitleCandidate>(shapes: &[S]) -> Option<String> {
    shapes
        .iter()
        .filter(|shape| shape.is_title_placeholder())
        .find_map(|shape| non_blank(shape.text()))
}

fn from_text_box<S: TitleCandidate>(shapes: &[S]) -> Option<String> {
    shapes
        .iter()
        .filter(|shape| shape.is_text_box())
        .find_map(|shape| non_blank(shape.text()))
}

fn from_any_text<S: TitleCandidate>(shapes: &[S]) -> Option<String> {
    shapes
        .iter()
        .filter(|shape| !shape.is_title_placeholder())
        .find_map(|shape| non_blank(shape.text()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fake {
        title: bool,
        text_box: bool,
        text: Option<&'static str>,
    }

    impl TitleCandidate for Fake {
        fn is_title_placeholder(&self) -> bool {
            self.title
        }
        fn is_text_box(&self) -> bool {
            self.text_box
        }
        fn text(&self) -> Option<String> {
            self.text.map(str::to_string)
        }
    }

    fn shape(title: bool, text_box: bool, text: Option<&'static str>) -> Fake {
        Fake {
            title,
            text_box,
            text,
        }
    }

    #[test]
    fn test_title_placeholder_wins() {
        let shapes = [
            shape(false, true, Some("box")),
            shape(true, false, Some("  Agenda  ")),
        ];
        assert_eq!(resolve_title(&shapes), "Agenda");
    }

    #[test]
    fn test_text_box_before_other_shapes() {
        let shapes = [
            shape(false, false, Some("body text")),
            shape(false, true, Some("caption")),
        ];
        assert_eq!(resolve_title(&shapes), "caption");
    }

    #[test]
    fn test_blank_placeholder_falls_through() {
        let shapes = [
            shape(true, false, Some("   ")),
            shape(false, false, None),
            shape(false, false, Some("first words")),
        ];
        assert_eq!(resolve_title(&shapes), "first words");
    }

    #[test]
    fn test_untitled_when_nothing_matches() {
        let shapes = [shape(false, false, None), shape(false, true, Some(""))];
        assert_eq!(resolve_title(&shapes), UNTITLED_SLIDE);
        assert_eq!(resolve_title::<Fake>(&[]), UNTITLED_SLIDE);
    }
}
