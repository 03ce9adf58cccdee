// File: src/interpreter/native_functions/graphics.rs
//
// Graphics native functions (`dmo.gr.*`) and the state behind them.
//
// Drawing calls append SVG markup to an in-memory document that is started
// on first use and closed when the run ends. Rectangles and text may be
// registered as elements with an id; elements carry a hitbox used by
// `collide` and by the simulated mouse in `dmo_element`. Input state is
// simulated: hosts press keys and move the mouse through `GraphicsContext`.

use crate::ast::Node;
use crate::config::WindowConfig;
use crate::errors::SourceLocation;
use crate::interpreter::diagnostics::Fault;
use crate::interpreter::{Interpreter, Value};
use ahash::AHashSet;
use std::fmt::Write as _;
use tracing::debug;

pub const NAMES: &[&str] = &[
    "dmo.gr.create.window",
    "dmo.gr.create.line",
    "dmo.gr.create.sqr",
    "dmo.gr.create.crle",
    "dmo.gr.display",
    "create.window",
    "create.line",
    "create.sqr",
    "create.crle",
    "display",
    "dmo_key",
    "dmo_element",
    "collide",
];

const DEFAULT_TITLE: &str = "DMO Graphics Window";
const DEFAULT_WINDOW_SIZE: i32 = 500;
const LINE_ORIGIN: (i32, i32) = (50, 100);
const CIRCLE_CENTER: i32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Each channel clamped into 0..=255
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        let channel = |c: i64| c.clamp(0, 255) as u8;
        Color { r: channel(r), g: channel(g), b: channel(b) }
    }
}

/// Axis-aligned rectangle in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    /// Right edge, saturating at the coordinate range
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge, saturating at the coordinate range
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
    }

    /// Point inside the rectangle, edges included
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsElement {
    pub id: Option<String>,
    pub bounds: Rect,
    pub hitbox: Rect,
    pub color: Color,
    pub shape: Shape,
}

#[derive(Debug, Default)]
struct InputState {
    keys: AHashSet<char>,
    mouse_pressed: bool,
    mouse_x: i32,
    mouse_y: i32,
}

/// Window, SVG document, elements and simulated input for one run
#[derive(Debug)]
pub struct GraphicsContext {
    title: String,
    width: i32,
    height: i32,
    window_created: bool,
    svg: Option<String>,
    elements: Vec<GraphicsElement>,
    input: InputState,
}

impl GraphicsContext {
    pub fn new(window: &WindowConfig) -> Self {
        GraphicsContext {
            title: window.title.clone(),
            width: i32::try_from(window.width).unwrap_or(i32::MAX),
            height: i32::try_from(window.height).unwrap_or(i32::MAX),
            window_created: false,
            svg: None,
            elements: Vec::new(),
            input: InputState::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn window_created(&self) -> bool {
        self.window_created
    }

    pub fn elements(&self) -> &[GraphicsElement] {
        &self.elements
    }

    pub fn find_element(&self, id: &str) -> Option<&GraphicsElement> {
        self.elements.iter().find(|element| element.id.as_deref() == Some(id))
    }

    /// Markup written so far, without the closing tag
    pub fn svg_markup(&self) -> Option<&str> {
        self.svg.as_deref()
    }

    pub fn create_window(&mut self, title: &str, size: i32) {
        self.title = title.to_string();
        self.width = size;
        self.height = size;
        self.window_created = true;
        self.start_svg();
        debug!(title, size, "created window");
    }

    pub fn draw_line(&mut self, length: i32) {
        let (x, y) = LINE_ORIGIN;
        self.push_markup(format_args!(
            "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"black\" stroke-width=\"2\"/>\n",
            x,
            y,
            x.saturating_add(length),
            y
        ));
        debug!(length, "created line");
    }

    pub fn draw_rect(&mut self, rect: Rect, id: Option<String>) {
        self.push_markup(format_args!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"black\" stroke-width=\"2\"/>\n",
            rect.x, rect.y, rect.width, rect.height
        ));
        if id.is_some() {
            self.add_element(id, rect, Color::default(), Shape::Rectangle);
        }
        debug!(x = rect.x, y = rect.y, width = rect.width, height = rect.height, "created square");
    }

    pub fn draw_circle(&mut self, radius: i32) {
        self.push_markup(format_args!(
            "  <circle cx=\"{c}\" cy=\"{c}\" r=\"{}\" fill=\"none\" stroke=\"black\" stroke-width=\"2\"/>\n",
            radius,
            c = CIRCLE_CENTER
        ));
        debug!(radius, "created circle");
    }

    /// The curve form of `create.crle`: the parameter sets both the vertical
    /// center and the vertical radius
    pub fn draw_ellipse(&mut self, radius: i32, param: i32) {
        self.push_markup(format_args!(
            "  <ellipse cx=\"{}\" cy=\"{p}\" rx=\"{}\" ry=\"{p}\" fill=\"none\" stroke=\"black\" stroke-width=\"2\"/>\n",
            CIRCLE_CENTER,
            radius,
            p = param
        ));
        debug!(radius, param, "created curve");
    }

    pub fn draw_text(&mut self, text: &str, rect: Rect, color: Color, id: Option<String>) {
        self.push_markup(format_args!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"Arial\" font-size=\"{}\" fill=\"rgb({},{},{})\">{}</text>\n",
            rect.x,
            rect.bottom(),
            rect.height,
            color.r,
            color.g,
            color.b,
            escape_xml(text)
        ));
        self.add_element(id, rect, color, Shape::Text);
        debug!(text, x = rect.x, y = rect.y, "displayed text");
    }

    fn add_element(&mut self, id: Option<String>, bounds: Rect, color: Color, shape: Shape) {
        self.elements.push(GraphicsElement { id, bounds, hitbox: bounds, color, shape });
    }

    pub fn press_key(&mut self, key: char) {
        self.input.keys.insert(key);
    }

    pub fn release_key(&mut self, key: char) {
        self.input.keys.remove(&key);
    }

    pub fn set_mouse(&mut self, x: i32, y: i32, pressed: bool) {
        self.input.mouse_x = x;
        self.input.mouse_y = y;
        self.input.mouse_pressed = pressed;
    }

    /// `"space"` names the space bar; any other name must be a single character
    pub fn key_pressed(&self, name: &str) -> bool {
        let key = match name {
            "space" => ' ',
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return false,
                }
            }
        };
        self.input.keys.contains(&key)
    }

    pub fn element_pressed(&self, id: &str) -> bool {
        self.input.mouse_pressed
            && self
                .find_element(id)
                .is_some_and(|element| element.bounds.contains(self.input.mouse_x, self.input.mouse_y))
    }

    /// Both elements exist and their hitboxes overlap
    pub fn collides(&self, a: &str, b: &str) -> bool {
        match (self.find_element(a), self.find_element(b)) {
            (Some(a), Some(b)) => a.hitbox.overlaps(&b.hitbox),
            _ => false,
        }
    }

    fn start_svg(&mut self) {
        if self.svg.is_some() {
            return;
        }
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n  \
             <title>{}</title>\n  \
             <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n",
            self.width,
            self.height,
            escape_xml(&self.title)
        );
        self.svg = Some(svg);
        debug!("SVG output started");
    }

    fn push_markup(&mut self, markup: std::fmt::Arguments<'_>) {
        self.start_svg();
        if let Some(svg) = self.svg.as_mut() {
            let _ = svg.write_fmt(markup);
        }
    }

    /// Closes the document and hands it over; None if nothing was drawn
    pub fn finish(&mut self) -> Option<String> {
        let mut svg = self.svg.take()?;
        svg.push_str("</svg>\n");
        Some(svg)
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Handle graphics function calls
/// Returns Some(value) if the function was handled, None if not recognized
pub fn handle(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
    location: &SourceLocation,
) -> Option<Value> {
    let short = name.strip_prefix("dmo.gr.").unwrap_or(name);
    let result = match short {
        "create.window" => create_window(interp, args),
        "create.line" => create_line(interp, args),
        "create.sqr" => create_sqr(interp, args),
        "create.crle" => create_crle(interp, args),
        "display" => display(interp, args),
        "dmo_key" => {
            string_args::<1>(interp, short, args).map(|[key]| Value::bool(interp.graphics.key_pressed(&key)))
        }
        "dmo_element" => string_args::<1>(interp, short, args)
            .map(|[id]| Value::bool(interp.graphics.element_pressed(&id))),
        "collide" => string_args::<2>(interp, short, args)
            .map(|[a, b]| Value::bool(interp.graphics.collides(&a, &b))),
        _ => return None,
    };
    Some(interp.settle(result, location.clone()))
}

fn create_window(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    let mut title = DEFAULT_TITLE.to_string();
    let mut size = DEFAULT_WINDOW_SIZE;
    for (position, value) in interp.evaluate_arguments(args).into_iter().enumerate() {
        match (position, value) {
            (0, Value::String(text)) => title = text,
            (0 | 1, Value::Number(n)) => size = n as i32,
            _ => {}
        }
    }
    interp.graphics.create_window(&title, size);
    Ok(Value::Void)
}

fn create_line(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    require_args("create.line", args, 1, "at least 1")?;
    let length = number_arg(interp, &args[0], "line length")?;
    interp.graphics.draw_line(length);
    Ok(Value::Void)
}

fn create_sqr(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    require_args("create.sqr", args, 4, "at least 4")?;
    let mut coords = [0; 4];
    for (slot, arg) in coords.iter_mut().zip(args) {
        *slot = number_arg(interp, arg, "square coordinates")?;
    }
    let id = match args.get(4) {
        Some(arg) => Some(string_arg(interp, arg, "element id")?),
        None => None,
    };
    let [x, y, width, height] = coords;
    interp.graphics.draw_rect(Rect::new(x, y, width, height), id);
    Ok(Value::Void)
}

fn create_crle(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    require_args("create.crle", args, 1, "at least 1")?;
    let radius = number_arg(interp, &args[0], "circle radius")?;
    match args.get(1) {
        None => interp.graphics.draw_circle(radius),
        Some(arg) => {
            let param = match interp.eval_value(arg) {
                Value::Number(n) => n as i32,
                _ => CIRCLE_CENTER,
            };
            interp.graphics.draw_ellipse(radius, param);
        }
    }
    Ok(Value::Void)
}

/// `display(text, x, y, width, height, r, g, b, id)`; everything after the
/// text is optional and filled in by groups
fn display(interp: &mut Interpreter, args: &[Node]) -> Result<Value, Fault> {
    require_args("display", args, 1, "at least 1")?;
    let text = string_arg(interp, &args[0], "display text")?;
    let values = interp.evaluate_arguments(&args[1..]);
    let number = |index: usize, default: i32| match values.get(index) {
        Some(Value::Number(n)) => *n as i32,
        _ => default,
    };

    let mut rect = Rect::new(10, 10, 100, 20);
    if values.len() >= 2 {
        rect.x = number(0, rect.x);
        rect.y = number(1, rect.y);
    }
    if values.len() >= 4 {
        rect.width = number(2, rect.width);
        rect.height = number(3, rect.height);
    }

    let mut color = Color::default();
    if let [Value::Number(r), Value::Number(g), Value::Number(b)] = values.get(4..7).unwrap_or(&[]) {
        color = Color::clamped(*r as i64, *g as i64, *b as i64);
    }

    let id = match values.get(7) {
        Some(Value::String(id)) => Some(id.clone()),
        _ => None,
    };

    interp.graphics.draw_text(&text, rect, color, id);
    Ok(Value::Void)
}

fn require_args(name: &str, args: &[Node], minimum: usize, expected: &str) -> Result<(), Fault> {
    if args.len() < minimum {
        return Err(Fault::arity(name, expected, args.len(), Value::Void));
    }
    Ok(())
}

fn number_arg(interp: &mut Interpreter, arg: &Node, what: &str) -> Result<i32, Fault> {
    match interp.eval_value(arg) {
        Value::Number(n) => Ok(n as i32),
        other => Err(Fault::type_error(
            format!("{} must be a number, found {}", what, other.kind_name()),
            Value::Void,
        )),
    }
}

fn string_arg(interp: &mut Interpreter, arg: &Node, what: &str) -> Result<String, Fault> {
    match interp.eval_value(arg) {
        Value::String(text) => Ok(text),
        other => Err(Fault::type_error(
            format!("{} must be a string, found {}", what, other.kind_name()),
            Value::Void,
        )),
    }
}

/// Exactly N string arguments, for the query functions
fn string_args<const N: usize>(
    interp: &mut Interpreter,
    name: &str,
    args: &[Node],
) -> Result<[String; N], Fault> {
    if args.len() != N {
        return Err(Fault::arity(name, &N.to_string(), args.len(), Value::Number(0.0)));
    }
    let values = interp.evaluate_arguments(args);
    let mut strings: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, value) in strings.iter_mut().zip(values) {
        *slot = match value {
            Value::String(text) => text,
            other => {
                return Err(Fault::type_error(
                    format!("{} arguments must be strings, found {}", name, other.kind_name()),
                    Value::Number(0.0),
                ))
            }
        };
    }
    Ok(strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use crate::errors::ErrorKind;

    fn context() -> GraphicsContext {
        GraphicsContext::new(&WindowConfig::default())
    }

    #[test]
    fn test_document_is_started_lazily_and_closed_on_finish() {
        let mut gfx = context();
        assert!(gfx.finish().is_none());

        gfx.draw_line(100);
        let svg = gfx.finish().unwrap();

        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<svg width=\"800\" height=\"600\""));
        assert!(svg.contains("<title>DMO Graphics Window</title>"));
        assert!(svg.contains("<line x1=\"50\" y1=\"100\" x2=\"150\" y2=\"100\""));
        assert!(svg.ends_with("</svg>\n"));
        assert!(gfx.svg_markup().is_none());
    }

    #[test]
    fn test_create_window_sets_square_size() {
        let mut interp = Interpreter::new();
        interp.eval_value(&call("dmo.gr.create.window", vec![string("Game"), num(349.0)]));

        assert!(interp.graphics().window_created());
        assert_eq!(interp.graphics().title(), "Game");
        assert_eq!(interp.graphics().size(), (349, 349));
        assert!(interp.graphics().svg_markup().unwrap().contains("<svg width=\"349\" height=\"349\""));
    }

    #[test]
    fn test_window_size_defaults_to_500() {
        let mut interp = Interpreter::new();
        interp.eval_value(&call("create.window", vec![]));
        assert_eq!(interp.graphics().size(), (500, 500));
    }

    #[test]
    fn test_circle_and_curve() {
        let mut gfx = context();
        gfx.draw_circle(40);
        gfx.draw_ellipse(40, 70);
        let svg = gfx.finish().unwrap();

        assert!(svg.contains("<circle cx=\"150\" cy=\"150\" r=\"40\""));
        assert!(svg.contains("<ellipse cx=\"150\" cy=\"70\" rx=\"40\" ry=\"70\""));
    }

    #[test]
    fn test_display_escapes_text_and_clamps_color() {
        let mut interp = Interpreter::new();
        interp.eval_value(&call(
            "dmo.gr.display",
            vec![
                string("a < b & c"),
                num(5.0),
                num(6.0),
                num(50.0),
                num(12.0),
                num(300.0),
                num(-4.0),
                num(128.0),
                string("label"),
            ],
        ));

        let markup = interp.graphics().svg_markup().unwrap();
        assert!(markup.contains(
            "<text x=\"5\" y=\"18\" font-family=\"Arial\" font-size=\"12\" fill=\"rgb(255,0,128)\">a &lt; b &amp; c</text>"
        ));
        let element = interp.graphics().find_element("label").unwrap();
        assert_eq!(element.shape, Shape::Text);
        assert_eq!(element.bounds, Rect::new(5, 6, 50, 12));
    }

    #[test]
    fn test_collision_is_strict() {
        let mut gfx = context();
        gfx.draw_rect(Rect::new(0, 0, 10, 10), Some("a".to_string()));
        gfx.draw_rect(Rect::new(5, 5, 10, 10), Some("b".to_string()));
        gfx.draw_rect(Rect::new(10, 0, 10, 10), Some("c".to_string()));

        assert!(gfx.collides("a", "b"));
        assert!(!gfx.collides("a", "c"));
        assert!(!gfx.collides("a", "missing"));
    }

    #[test]
    fn test_huge_coordinates_saturate_instead_of_overflowing() {
        let mut interp = Interpreter::new();
        interp.eval_value(&call("dmo.gr.create.line", vec![num(3e9)]));
        interp.eval_value(&call(
            "dmo.gr.create.sqr",
            vec![num(2e9), num(0.0), num(2e9), num(10.0), string("far")],
        ));
        interp.eval_value(&call(
            "dmo.gr.create.sqr",
            vec![num(0.0), num(0.0), num(10.0), num(10.0), string("near")],
        ));
        interp.eval_value(&call(
            "dmo.gr.create.sqr",
            vec![num(2.1e9), num(0.0), num(10.0), num(10.0), string("edge")],
        ));
        interp.eval_value(&call(
            "dmo.gr.display",
            vec![string("hi"), num(0.0), num(2e9), num(10.0), num(2e9)],
        ));

        assert_eq!(interp.eval_value(&call("collide", vec![string("near"), string("far")])), Value::Number(0.0));
        assert_eq!(interp.eval_value(&call("collide", vec![string("far"), string("edge")])), Value::Number(1.0));

        interp.graphics_mut().set_mouse(i32::MAX, 5, true);
        assert_eq!(interp.eval_value(&call("dmo_element", vec![string("far")])), Value::Number(1.0));

        let svg = interp.graphics().svg_markup().unwrap().to_string();
        assert!(svg.contains(&format!("x2=\"{}\"", i32::MAX)));
        assert!(svg.contains(&format!("<text x=\"0\" y=\"{}\"", i32::MAX)));
        assert!(interp.diagnostics().is_empty());
    }

    #[test]
    fn test_simulated_input() {
        let mut gfx = context();
        gfx.draw_rect(Rect::new(10, 10, 20, 20), Some("button".to_string()));
        gfx.press_key(' ');
        gfx.set_mouse(30, 30, true);

        assert!(gfx.key_pressed("space"));
        assert!(!gfx.key_pressed("a"));
        assert!(gfx.element_pressed("button"));

        gfx.set_mouse(31, 30, true);
        assert!(!gfx.element_pressed("button"));
        gfx.release_key(' ');
        assert!(!gfx.key_pressed("space"));
    }

    #[test]
    fn test_argument_errors_follow_call_kind() {
        let mut interp = Interpreter::new();
        let drawn = interp.eval_value(&call("dmo.gr.create.sqr", vec![num(1.0), num(2.0)]));
        let queried = interp.eval_value(&call("collide", vec![string("a"), num(1.0)]));
        let key = interp.eval_value(&call("dmo_key", vec![]));

        assert_eq!(drawn, Value::Void);
        assert_eq!(queried, Value::Number(0.0));
        assert_eq!(key, Value::Number(0.0));
        assert_eq!(
            interp.diagnostics().kinds(),
            vec![ErrorKind::ArityError, ErrorKind::TypeError, ErrorKind::ArityError]
        );
    }
}
