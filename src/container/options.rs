use crossterm::event::KeyCode;

use crate::error::{DeckError, Result};
use crate::style::{Color, LineStyle};
use crate::widget::Widget;

/// Axis of a binary split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SplitKind {
    Vertical,
    Horizontal,
}

enum SpecOption {
    Border(LineStyle),
    BorderColor(Color),
    SplitVertical(Box<ContainerSpec>, Box<ContainerSpec>),
    SplitHorizontal(Box<ContainerSpec>, Box<ContainerSpec>),
    SplitPercent(u8),
    Widget(Box<dyn Widget>),
    FocusGroup(u32),
    FocusSkip,
    KeyFocusNext(KeyCode),
    KeyFocusPrevious(KeyCode),
    KeysFocusGroupNext(u32, Vec<KeyCode>),
    KeysFocusGroupPrevious(u32, Vec<KeyCode>),
}

impl std::fmt::Debug for SpecOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecOption::Border(style) => f.debug_tuple("Border").field(style).finish(),
            SpecOption::BorderColor(color) => f.debug_tuple("BorderColor").field(color).finish(),
            SpecOption::SplitVertical(a, b) => {
                f.debug_tuple("SplitVertical").field(a).field(b).finish()
            }
            SpecOption::SplitHorizontal(a, b) => {
                f.debug_tuple("SplitHorizontal").field(a).field(b).finish()
            }
            SpecOption::SplitPercent(p) => f.debug_tuple("SplitPercent").field(p).finish(),
            SpecOption::Widget(_) => f.debug_tuple("Widget").field(&"<dyn Widget>").finish(),
            SpecOption::FocusGroup(g) => f.debug_tuple("FocusGroup").field(g).finish(),
            SpecOption::FocusSkip => f.debug_tuple("FocusSkip").finish(),
            SpecOption::KeyFocusNext(k) => f.debug_tuple("KeyFocusNext").field(k).finish(),
            SpecOption::KeyFocusPrevious(k) => f.debug_tuple("KeyFocusPrevious").field(k).finish(),
            SpecOption::KeysFocusGroupNext(g, keys) => f
                .debug_tuple("KeysFocusGroupNext")
                .field(g)
                .field(keys)
                .finish(),
            SpecOption::KeysFocusGroupPrevious(g, keys) => f
                .debug_tuple("KeysFocusGroupPrevious")
                .field(g)
                .field(keys)
                .finish(),
        }
    }
}

/// Declarative description of one container and, through its splits, the
/// whole tree below it. Options apply in call order; repeating an option
/// overwrites the earlier value.
#[derive(Default, Debug)]
pub struct ContainerSpec {
    options: Vec<SpecOption>,
}

impl ContainerSpec {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, option: SpecOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn border(self, style: LineStyle) -> Self {
        self.push(SpecOption::Border(style))
    }

    pub fn border_color(self, color: Color) -> Self {
        self.push(SpecOption::BorderColor(color))
    }

    /// Split into a left and right child along the x axis.
    pub fn split_vertical(self, left: ContainerSpec, right: ContainerSpec) -> Self {
        self.push(SpecOption::SplitVertical(Box::new(left), Box::new(right)))
    }

    /// Split into a top and bottom child along the y axis.
    pub fn split_horizontal(self, top: ContainerSpec, bottom: ContainerSpec) -> Self {
        self.push(SpecOption::SplitHorizontal(Box::new(top), Box::new(bottom)))
    }

    /// Percentage of the child area assigned to the first child of the
    /// split, in [1, 99]. Defaults to an even split.
    pub fn split_percent(self, percent: u8) -> Self {
        self.push(SpecOption::SplitPercent(percent))
    }

    pub fn widget(self, widget: impl Widget + 'static) -> Self {
        self.push(SpecOption::Widget(Box::new(widget)))
    }

    pub fn focus_group(self, group: u32) -> Self {
        self.push(SpecOption::FocusGroup(group))
    }

    /// Exclude this container from global next/previous key traversal.
    pub fn key_focus_skip(self) -> Self {
        self.push(SpecOption::FocusSkip)
    }

    pub fn key_focus_next(self, key: KeyCode) -> Self {
        self.push(SpecOption::KeyFocusNext(key))
    }

    pub fn key_focus_previous(self, key: KeyCode) -> Self {
        self.push(SpecOption::KeyFocusPrevious(key))
    }

    pub fn keys_focus_group_next(self, group: u32, keys: Vec<KeyCode>) -> Self {
        self.push(SpecOption::KeysFocusGroupNext(group, keys))
    }

    pub fn keys_focus_group_previous(self, group: u32, keys: Vec<KeyCode>) -> Self {
        self.push(SpecOption::KeysFocusGroupPrevious(group, keys))
    }
}

/// Flat option values for one node after folding the spec.
#[derive(Debug)]
pub(crate) struct ResolvedOptions {
    pub border: LineStyle,
    pub border_color: Option<Color>,
    pub split_percent: u8,
    pub focus_group: u32,
    pub focus_skip: bool,
    pub key_next: Option<KeyCode>,
    pub key_previous: Option<KeyCode>,
    pub group_next: Vec<(u32, Vec<KeyCode>)>,
    pub group_previous: Vec<(u32, Vec<KeyCode>)>,
}

pub(crate) struct ResolvedSpec {
    pub options: ResolvedOptions,
    pub split: Option<(SplitKind, ContainerSpec, ContainerSpec)>,
    pub widget: Option<Box<dyn Widget>>,
}

impl std::fmt::Debug for ResolvedSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSpec")
            .field("options", &self.options)
            .field("split", &self.split)
            .field("widget", &self.widget.as_ref().map(|_| "<dyn Widget>"))
            .finish()
    }
}

/// Fold the option list into flat values, last write wins. Structural
/// mistakes surface here as config errors before any node is built.
pub(crate) fn resolve(spec: ContainerSpec) -> Result<ResolvedSpec> {
    let mut options = ResolvedOptions {
        border: LineStyle::None,
        border_color: None,
        split_percent: 50,
        focus_group: 0,
        focus_skip: false,
        key_next: None,
        key_previous: None,
        group_next: Vec::new(),
        group_previous: Vec::new(),
    };
    let mut split = None;
    let mut widget: Option<Box<dyn Widget>> = None;

    for option in spec.options {
        match option {
            SpecOption::Border(style) => options.border = style,
            SpecOption::BorderColor(color) => options.border_color = Some(color),
            SpecOption::SplitVertical(first, second) => {
                split = Some((SplitKind::Vertical, *first, *second));
            }
            SpecOption::SplitHorizontal(first, second) => {
                split = Some((SplitKind::Horizontal, *first, *second));
            }
            SpecOption::SplitPercent(percent) => {
                if !(1..=99).contains(&percent) {
                    return Err(DeckError::Config(format!(
                        "split percent {percent} outside the valid range [1, 99]"
                    )));
                }
                options.split_percent = percent;
            }
            SpecOption::Widget(w) => widget = Some(w),
            SpecOption::FocusGroup(group) => options.focus_group = group,
            SpecOption::FocusSkip => options.focus_skip = true,
            SpecOption::KeyFocusNext(key) => options.key_next = Some(key),
            SpecOption::KeyFocusPrevious(key) => options.key_previous = Some(key),
            SpecOption::KeysFocusGroupNext(group, keys) => {
                options.group_next.retain(|(g, _)| *g != group);
                options.group_next.push((group, keys));
            }
            SpecOption::KeysFocusGroupPrevious(group, keys) => {
                options.group_previous.retain(|(g, _)| *g != group);
                options.group_previous.push((group, keys));
            }
        }
    }

    if split.is_some() && widget.is_some() {
        return Err(DeckError::Config(
            "a container cannot carry both a split and a widget".to_string(),
        ));
    }

    Ok(ResolvedSpec {
        options,
        split,
        widget,
    })
}
