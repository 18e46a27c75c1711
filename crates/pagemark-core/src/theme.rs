use ratatui::style::Modifier;
use ratatui::style::Style;

#[derive(Clone, Debug)]
pub struct Theme {
    pub text_primary: Style,
    pub text_muted: Style,
    pub accent: Style,
    pub danger: Style,
    pub code_inline: Style,
    pub code_block: Style,
    pub heading: Style,
    pub link: Style,
    pub math: Style,
    pub quote: Style,
    pub selection: Style,
    pub divider: Style,
    pub divider_active: Style,
    pub toast: Style,
    pub status: Style,
}

impl Default for Theme {
    fn default() -> Self {
        use ratatui::style::Stylize;

        Self {
            text_primary: Style::default(),
            text_muted: Style::default().dark_gray(),
            accent: Style::default().cyan(),
            danger: Style::default().red(),
            code_inline: Style::default().cyan(),
            code_block: Style::default().gray(),
            heading: Style::default().cyan().add_modifier(Modifier::BOLD),
            link: Style::default().blue().add_modifier(Modifier::UNDERLINED),
            math: Style::default().magenta(),
            quote: Style::default().dark_gray().add_modifier(Modifier::ITALIC),
            selection: Style::default().reversed(),
            divider: Style::default().dark_gray(),
            divider_active: Style::default().cyan(),
            toast: Style::default().black().on_yellow(),
            status: Style::default().dark_gray(),
        }
    }
}
