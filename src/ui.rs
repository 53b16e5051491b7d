use anyhow::Result;
use college_finder::{
    group_by_location, Catalog, CatalogQuery, CollegeRecord, CollegeType, Facets, LocationGroup,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const PAGE_JUMP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Colleges,
    Locations,
    Filters,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Colleges => Page::Locations,
            Page::Locations => Page::Filters,
            Page::Filters => Page::Colleges,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Colleges => Page::Filters,
            Page::Locations => Page::Colleges,
            Page::Filters => Page::Locations,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Colleges => "Colleges",
            Page::Locations => "Locations",
            Page::Filters => "Filters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub struct App {
    pub catalog: Catalog,
    pub query: CatalogQuery,
    pub visible: Vec<CollegeRecord>,
    pub state: TableState,
    pub current_page: Page,
    pub locations_state: TableState,
    pub show_detail: bool,
    pub input_mode: InputMode,
    facets: Facets,
}

impl App {
    pub fn new(catalog: Catalog) -> Self {
        let facets = catalog.facets();
        let mut app = Self {
            catalog,
            query: CatalogQuery::default(),
            visible: Vec::new(),
            state: TableState::default(),
            current_page: Page::Colleges,
            locations_state: TableState::default(),
            show_detail: false,
            input_mode: InputMode::Normal,
            facets,
        };
        app.refresh();
        app
    }

    /// Recompute the visible list from the full catalog.
    pub fn refresh(&mut self) {
        self.visible = self.catalog.view(&self.query);

        let first = if self.visible.is_empty() { None } else { Some(0) };
        self.state.select(first);
        self.locations_state.select(first);
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_college(&self) -> Option<&CollegeRecord> {
        self.state.selected().and_then(|i| self.visible.get(i))
    }

    pub fn location_groups(&self) -> Vec<LocationGroup> {
        group_by_location(&self.visible)
    }

    // ------------------------------------------------------------------
    // Query edits
    // ------------------------------------------------------------------

    pub fn push_search_char(&mut self, c: char) {
        self.query.query.push(c);
        self.refresh();
    }

    pub fn pop_search_char(&mut self) {
        self.query.query.pop();
        self.refresh();
    }

    pub fn toggle_rank_sort(&mut self) {
        self.query.sort_by_rank = !self.query.sort_by_rank;
        self.refresh();
    }

    pub fn cycle_sort(&mut self) {
        self.query.sort = self.query.sort.next();
        self.refresh();
    }

    pub fn cycle_type(&mut self) {
        let current = self.query.filters.college_type.as_ref().map(|t| t.name().to_string());
        self.query.filters.college_type =
            cycle(&current, &self.facets.types).map(|t| CollegeType::parse(&t));
        self.refresh();
    }

    pub fn cycle_state(&mut self) {
        self.query.filters.state = cycle(&self.query.filters.state, &self.facets.states);
        self.refresh();
    }

    pub fn cycle_quota(&mut self) {
        self.query.filters.quota = cycle(&self.query.filters.quota, &self.facets.quotas);
        self.refresh();
    }

    pub fn cycle_category(&mut self) {
        self.query.filters.category = cycle(&self.query.filters.category, &self.facets.categories);
        self.refresh();
    }

    pub fn toggle_hostel(&mut self) {
        self.query.filters.hostel_required = !self.query.filters.hostel_required;
        self.refresh();
    }

    pub fn toggle_all_fields(&mut self) {
        self.query.filters.search_all_fields = !self.query.filters.search_all_fields;
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.query = CatalogQuery::default();
        self.refresh();
    }

    /// Short description of every active filter, for the status bar.
    pub fn active_filters(&self) -> Vec<String> {
        let filters = &self.query.filters;
        let mut active = Vec::new();

        if let Some(t) = &filters.college_type {
            active.push(format!("type={}", t.name()));
        }
        if let Some(s) = &filters.state {
            active.push(format!("state={}", s));
        }
        if let Some(q) = &filters.quota {
            active.push(format!("quota={}", q));
        }
        if let Some(c) = &filters.category {
            active.push(format!("category={}", c));
        }
        if let Some(b) = &filters.branch {
            active.push(format!("branch={}", b));
        }
        if let Some(r) = filters.min_rating {
            active.push(format!("rating>={:.1}", r));
        }
        if filters.hostel_required {
            active.push("hostel".to_string());
        }
        active
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_list(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::Locations => {
                let len = group_by_location(&self.visible).len();
                (&mut self.locations_state, len)
            }
            _ => (&mut self.state, self.visible.len()),
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| (i + PAGE_JUMP).min(len - 1));
        state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = state.selected().map_or(0, |i| i.saturating_sub(PAGE_JUMP));
        state.select(Some(i));
    }

    pub fn last(&mut self) {
        let (state, len) = self.active_list();
        if len > 0 {
            state.select(Some(len - 1));
        }
    }

    /// Apply one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input_mode == InputMode::Search {
            match key.code {
                KeyCode::Enter => self.input_mode = InputMode::Normal,
                KeyCode::Esc => {
                    self.query.query.clear();
                    self.refresh();
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Backspace => self.pop_search_char(),
                KeyCode::Char(c) => self.push_search_char(c),
                _ => {}
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
                self.current_page = Page::Colleges;
            }
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::Char('r') => self.toggle_rank_sort(),
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('c') => self.clear_filters(),
            KeyCode::Char('1') if self.current_page == Page::Filters => self.cycle_type(),
            KeyCode::Char('2') if self.current_page == Page::Filters => self.cycle_state(),
            KeyCode::Char('3') if self.current_page == Page::Filters => self.cycle_quota(),
            KeyCode::Char('4') if self.current_page == Page::Filters => self.cycle_category(),
            KeyCode::Char('5') if self.current_page == Page::Filters => self.toggle_hostel(),
            KeyCode::Char('6') if self.current_page == Page::Filters => self.toggle_all_fields(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::PageDown => self.page_down(),
            KeyCode::PageUp => self.page_up(),
            KeyCode::Home => {
                let (state, len) = self.active_list();
                if len > 0 {
                    state.select(Some(0));
                }
            }
            KeyCode::End => self.last(),
            _ => {}
        }
        false
    }
}

/// None -> first option -> ... -> last option -> None
fn cycle(current: &Option<String>, options: &[String]) -> Option<String> {
    match current {
        None => options.first().cloned(),
        Some(value) => options
            .iter()
            .position(|o| o.eq_ignore_ascii_case(value))
            .and_then(|i| options.get(i + 1))
            .cloned(),
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_search(f, chunks[1], app);

    if app.show_detail && app.current_page == Page::Colleges {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[2]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Colleges => render_table(f, chunks[2], app),
            Page::Locations => render_locations(f, chunks[2], app),
            Page::Filters => render_filters(f, chunks[2], app),
        }
    }

    render_status_bar(f, chunks[3], app);
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn label_style() -> Style {
    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Colleges, Page::Locations, Page::Filters].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Showing {} of {}", app.visible.len(), app.catalog.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Sort: {}", app.query.effective_sort().label()),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.catalog.source().to_string(),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" 🎓 College Finder "),
    );

    f.render_widget(header, area);
}

fn render_search(f: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Search;
    let scope = if app.query.filters.search_all_fields {
        "all fields"
    } else {
        "name"
    };

    let mut spans = vec![Span::raw(" "), Span::raw(app.query.query.clone())];
    if editing {
        spans.push(Span::styled("▏", key_style()));
    } else if app.query.query.is_empty() {
        spans.push(Span::styled(
            "press / to search",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    let border = if editing { Color::Yellow } else { Color::White };
    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(format!(" Search ({}) ", scope)),
    );

    f.render_widget(search, area);
}

fn type_color(college_type: &CollegeType) -> Color {
    match college_type {
        CollegeType::Medical => Color::Red,
        CollegeType::Engineering => Color::Blue,
        CollegeType::Nursing => Color::Magenta,
        CollegeType::Dental => Color::Cyan,
        CollegeType::Pharmacy => Color::Green,
        CollegeType::Other(_) => Color::White,
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Rank", "Name", "Location", "State", "Type", "Rating", "Quota"]
        .iter()
        .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.visible.iter().map(|college| {
        let rank = college
            .effective_rank()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());

        Row::new(vec![
            Cell::from(rank),
            Cell::from(truncate(&college.name, 40)),
            Cell::from(truncate(&college.location, 16)),
            Cell::from(truncate(&college.state, 16)),
            Cell::from(college.college_type.name().to_string())
                .style(Style::default().fg(type_color(&college.college_type))),
            Cell::from(format!("{:.1}", college.rating)),
            Cell::from(truncate(&college.quota, 12)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Length(42),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(13),
            Constraint::Length(7),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Colleges "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_locations(f: &mut Frame, area: Rect, app: &mut App) {
    let groups = app.location_groups();

    let header_cells = ["Location", "Colleges", "Map position"]
        .iter()
        .map(|h| Cell::from(*h).style(header_style()));

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = groups.iter().map(|group| {
        let position = match group.marker {
            Some(m) => format!("{:.1}% / {:.1}%", m.x_percent, m.y_percent),
            None => "unmapped".to_string(),
        };

        Row::new(vec![
            Cell::from(truncate(&group.display_name, 34)),
            Cell::from(group.summary()),
            Cell::from(position),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [Constraint::Length(36), Constraint::Length(22), Constraint::Length(20)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" 🗺️ Colleges by Location "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.locations_state);
}

fn filter_line<'a>(key: &'a str, label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, key_style()),
        Span::raw(". "),
        Span::raw(format!("{:<22}", label)),
        Span::styled(value, Style::default().fg(Color::Green)),
    ])
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let filters = &app.query.filters;
    let or_any = |v: &Option<String>| v.clone().unwrap_or_else(|| "any".to_string());
    let on_off = |b: bool| if b { "on" } else { "off" }.to_string();

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("  Filters", label_style())),
        Line::from(""),
        filter_line(
            "1",
            "College type",
            filters
                .college_type
                .as_ref()
                .map(|t| t.name().to_string())
                .unwrap_or_else(|| "any".to_string()),
        ),
        filter_line("2", "State", or_any(&filters.state)),
        filter_line("3", "Quota", or_any(&filters.quota)),
        filter_line("4", "Category", or_any(&filters.category)),
        filter_line("5", "Hostel required", on_off(filters.hostel_required)),
        filter_line("6", "Search all fields", on_off(filters.search_all_fields)),
        Line::from(""),
        Line::from(Span::styled("  Ordering", label_style())),
        Line::from(""),
        filter_line("r", "Sort by rank", on_off(app.query.sort_by_rank)),
        filter_line("s", "Sort order", app.query.sort.label().to_string()),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  Press 1-6 to change a filter, ",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
            Span::styled("c", key_style().add_modifier(Modifier::ITALIC)),
            Span::styled(
                " to clear",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Filters "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.visible.len()),
        Style::default().fg(Color::Cyan),
    )];

    let active = app.active_filters();
    if !active.is_empty() {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", active.join(", ")),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", key_style()));
        status_spans.push(Span::raw(" clear)"));
    }

    for (key, action) in [
        ("/", " Search"),
        ("r", " Rank"),
        ("s", " Sort"),
        ("Enter", " Details"),
        ("Tab", " Page"),
    ] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, key_style()));
        status_spans.push(Span::raw(action));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" College Details ");

    let college = match app.selected_college() {
        Some(c) => c,
        None => {
            f.render_widget(Paragraph::new("No college selected").block(block), area);
            return;
        }
    };

    let field = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("  {}: ", label), label_style()), Span::raw(value)])
    };
    let yes_no = |b: bool| if b { "Available" } else { "Not available" }.to_string();

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", college.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Location", format!("{}, {}", college.location, college.state)),
        field("Type", college.college_type.name().to_string()),
        field("Established", college.established_year.to_string()),
        field("Rating", format!("{:.1} / 5", college.rating)),
        field(
            "Closing rank",
            college
                .effective_rank()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "not ranked".to_string()),
        ),
        field("Fees", college.fees.clone()),
        field("Quota", college.quota.clone()),
        field("Category", college.category.clone()),
        field("Hostel", yes_no(college.hostel_available)),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(Span::styled(
            "  BRANCHES",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
        Line::from(""),
        Line::from(Span::raw(format!("  {}", college.branches.join(", ")))),
        Line::from(""),
        field("Phone", college.phone.clone()),
        field("Website", college.website.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "  Press Enter to close",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_new_app_shows_everything() {
        let app = App::new(Catalog::seeded());
        assert_eq!(app.visible.len(), 10);
        assert_eq!(app.state.selected(), Some(0));
        assert!(app.active_filters().is_empty());
    }

    #[test]
    fn test_search_recomputes_on_every_keystroke() {
        let mut app = App::new(Catalog::seeded());

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);

        type_text(&mut app, "med");
        assert!(app.visible.iter().all(|c| c.name.to_lowercase().contains("med")));
        let narrowed = app.visible.len();

        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.visible.len(), 10, "Clearing the query restores the full list");
        assert!(narrowed < 10);

        // 'q' while typing is text, not quit
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.query.query, "q");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.query.query.is_empty());
    }

    #[test]
    fn test_rank_toggle_orders_ranked_first() {
        let mut app = App::new(Catalog::seeded());
        press(&mut app, KeyCode::Char('r'));

        assert_eq!(app.visible[0].effective_rank(), Some(50));
        assert!(!app.visible.last().unwrap().is_ranked(), "Unranked sorts last");

        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.visible[0].id, "1");
        assert_eq!(app.visible[1].id, "2", "Toggle off restores input order");
    }

    #[test]
    fn test_filter_keys_only_on_filters_page() {
        let mut app = App::new(Catalog::seeded());

        press(&mut app, KeyCode::Char('5'));
        assert!(!app.query.filters.hostel_required);

        app.current_page = Page::Filters;
        press(&mut app, KeyCode::Char('5'));
        assert!(app.query.filters.hostel_required);
        assert!(app.visible.iter().all(|c| c.hostel_available));
        assert_eq!(app.active_filters(), vec!["hostel".to_string()]);

        press(&mut app, KeyCode::Char('c'));
        assert!(app.query.filters.is_empty());
        assert_eq!(app.visible.len(), 10);
    }

    #[test]
    fn test_cycle_type_wraps_to_none() {
        let mut app = App::new(Catalog::seeded());
        let type_count = app.catalog.facets().types.len();

        for _ in 0..type_count {
            app.cycle_type();
            assert!(app.query.filters.college_type.is_some());
        }
        app.cycle_type();
        assert!(app.query.filters.college_type.is_none());
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = App::new(Catalog::seeded());

        app.previous();
        assert_eq!(app.state.selected(), Some(9));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
        app.page_down();
        assert_eq!(app.state.selected(), Some(9));
        app.page_up();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_empty_view_has_no_selection() {
        let mut app = App::new(Catalog::seeded());
        app.input_mode = InputMode::Search;
        type_text(&mut app, "zzzz");

        assert!(app.visible.is_empty());
        assert_eq!(app.state.selected(), None);
        assert!(app.selected_college().is_none());
        app.next();
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_locations_page_navigation() {
        let mut app = App::new(Catalog::seeded());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_page, Page::Locations);

        let groups = app.location_groups();
        assert_eq!(groups.len(), 9, "Two seed colleges share New Delhi");

        app.previous();
        assert_eq!(app.locations_state.selected(), Some(8));
        assert_eq!(app.state.selected(), Some(0), "College selection untouched");
    }

    #[test]
    fn test_truncate_handles_multibyte() {
        assert_eq!(truncate("₹17,50,000/year", 8), "₹17,5...");
        assert_eq!(truncate("short", 8), "short");
    }
}
