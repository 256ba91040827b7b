use std::time::Duration;

use iced::{
    Border, Color, Element, Font, Length, Theme,
    alignment::Vertical,
    font,
    widget::{Column, Row, Space, button, container, row, text, text_input, tooltip},
};
use shamsi::{color::Rgb, jalali::GridCell};

pub const BOLD: Font = Font {
    family: font::Family::SansSerif,
    weight: font::Weight::Bold,
    stretch: font::Stretch::Normal,
    style: font::Style::Normal,
};

const GRID_SPACING: f32 = 4.0;

pub fn square_button<'a, Message: Clone + 'a>(
    label: &'a str,
    tooltip_label: &'a str,
    msg: Message,
    style: impl Fn(&Theme, button::Status) -> button::Style + 'a,
) -> Element<'a, Message> {
    with_tooltip(
        button(text(label).size(14)).style(style).on_press(msg),
        tooltip_label,
    )
}

pub fn with_tooltip<'a, Message: 'a>(
    content: impl Into<Element<'a, Message>>,
    tooltip_label: impl text::IntoFragment<'a>,
) -> Element<'a, Message> {
    tooltip(
        content,
        container(text(tooltip_label))
            .padding(5)
            .style(|theme| container::dark(theme)),
        tooltip::Position::Bottom,
    )
    .delay(Duration::from_millis(500))
    .into()
}

/// Flat button for the toolbar's file actions.
pub fn menu_button<'a, Message: Clone + 'a>(label: &'a str, msg: Message) -> Element<'a, Message> {
    button(text(label).align_y(Vertical::Center))
        .padding([4, 8])
        .style(style::toplevel)
        .on_press(msg)
        .into()
}

/// A bold label next to a text input, for forms.
pub fn text_field<'a, Message: Clone + 'a>(
    label: &'a str,
    placeholder: &'a str,
    value: &str,
    on_input: impl Fn(String) -> Message + 'a,
    on_submit: Message,
) -> Element<'a, Message> {
    let label_text = text(label).font(BOLD).width(Length::FillPortion(1));
    let input = text_input(placeholder, value)
        .on_input(on_input)
        .on_submit(on_submit)
        .padding(10)
        .width(Length::FillPortion(3));
    row![label_text, input]
        .spacing(10)
        .width(Length::Fill)
        .align_y(Vertical::Center)
        .into()
}

/// Render colour of a `#rrggbb` string. Unreadable colours fall back to grey.
pub fn hex_color(hex: &str) -> Color {
    match Rgb::parse(hex) {
        Ok(rgb) => Color::from_rgb8(rgb.r, rgb.g, rgb.b),
        Err(err) => {
            log::debug!("{err}");
            Color::from_rgb8(0xcc, 0xcc, 0xcc)
        }
    }
}

/// Text colour that stays readable on `hex`.
pub fn contrast_color(hex: &str) -> Color {
    match Rgb::parse(hex) {
        Ok(rgb) if !rgb.is_light() => Color::WHITE,
        _ => Color::BLACK,
    }
}

pub fn filled(
    fill: Color,
    text_color: Color,
) -> impl Fn(&Theme, button::Status) -> button::Style {
    move |theme, status| {
        let background = match status {
            button::Status::Hovered => Color { a: 0.8, ..fill },
            button::Status::Pressed => Color { a: 0.6, ..fill },
            _ => fill,
        };
        button::Style {
            background: Some(background.into()),
            text_color,
            border: Border::default().rounded(4.0),
            ..button::primary(theme, status)
        }
    }
}

pub fn swatch<'a, Message: 'a>(color: Color, side: f32) -> Element<'a, Message> {
    container(Space::new())
        .width(Length::Fixed(side))
        .height(Length::Fixed(side))
        .style(move |theme: &Theme| container::Style {
            background: Some(color.into()),
            border: Border {
                width: 1.0,
                color: theme.extended_palette().background.strong.color,
                ..Border::default().rounded(3.0)
            },
            ..container::Style::default()
        })
        .into()
}

/// Places month cells on a 7-column grid, leaving blanks before the first
/// day and after the last.
pub fn calendar_grid<'a, Message: 'a>(
    cells: Vec<(GridCell, Element<'a, Message>)>,
    cell_width: f32,
    cell_height: f32,
) -> Element<'a, Message> {
    let mut slots: Vec<Vec<Option<Element<'a, Message>>>> = Vec::new();
    for (cell, element) in cells {
        if slots.len() <= cell.row {
            slots.resize_with(cell.row + 1, || (0..7).map(|_| None).collect());
        }
        slots[cell.row][cell.column] = Some(element);
    }
    Column::new()
        .spacing(GRID_SPACING)
        .extend(slots.into_iter().map(|week| {
            Row::new()
                .spacing(GRID_SPACING)
                .extend(week.into_iter().map(|slot| {
                    slot.unwrap_or_else(|| {
                        Space::new()
                            .width(Length::Fixed(cell_width))
                            .height(Length::Fixed(cell_height))
                            .into()
                    })
                }))
                .into()
        }))
        .into()
}

mod style {
    use iced::{
        Color, Theme,
        widget::button::{Status, Style},
    };

    pub(crate) fn toplevel(theme: &Theme, status: Status) -> Style {
        let palette = theme.extended_palette();
        let base = Style {
            text_color: palette.background.base.text,
            ..Style::default()
        };
        match status {
            Status::Active => base.with_background(palette.background.neutral.color),
            Status::Hovered => base.with_background(palette.primary.weak.color),
            Status::Disabled => base.with_background(Color::TRANSPARENT),
            Status::Pressed => base.with_background(palette.primary.strong.color),
        }
    }
}
