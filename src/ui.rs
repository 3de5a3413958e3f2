use asset_flow::categories::Category;
use asset_flow::db::SnapshotStore;
use asset_flow::form::FormSchema;
use asset_flow::graph::AssetGraph;
use asset_flow::session::{Dashboard, RecordSource};
use anyhow::Result;
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
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Categories,
    Update,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Categories,
            Page::Categories => Page::Update,
            Page::Update => Page::Overview,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Overview => Page::Update,
            Page::Categories => Page::Overview,
            Page::Update => Page::Categories,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Categories => "Categories",
            Page::Update => "Update",
        }
    }
}

/// Line being typed at the bottom of the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    NewItem(String),
    EditField { key: String, buffer: String },
}

impl InputMode {
    fn buffer_mut(&mut self) -> &mut String {
        match self {
            InputMode::NewItem(buffer) => buffer,
            InputMode::EditField { buffer, .. } => buffer,
        }
    }
}

pub struct App<S: SnapshotStore> {
    pub dashboard: Dashboard<S>,
    /// Working copy of the form; edits stay here until saved
    pub form: FormSchema,
    pub current_page: Page,
    pub category_index: usize,
    pub item_state: TableState,
    pub field_state: TableState,
    pub input: Option<InputMode>,
    pub status: Option<String>,
}

impl<S: SnapshotStore> App<S> {
    pub fn new(dashboard: Dashboard<S>) -> Self {
        let form = dashboard.form();

        let mut field_state = TableState::default();
        if form.field_count() > 0 {
            field_state.select(Some(0));
        }

        Self {
            dashboard,
            form,
            current_page: Page::Overview,
            category_index: 0,
            item_state: TableState::default(),
            field_state,
            input: None,
            status: None,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.dashboard.registry().categories().get(self.category_index)
    }

    fn selected_category_name(&self) -> Option<String> {
        self.selected_category().map(|c| c.name.clone())
    }

    fn custom_item_count(&self) -> usize {
        self.selected_category().map(|c| c.custom_items().len()).unwrap_or(0)
    }

    pub fn next_category(&mut self) {
        let len = self.dashboard.registry().categories().len();
        if len == 0 {
            return;
        }
        self.category_index = (self.category_index + 1) % len;
        self.reset_item_selection();
    }

    pub fn previous_category(&mut self) {
        let len = self.dashboard.registry().categories().len();
        if len == 0 {
            return;
        }
        self.category_index = match self.category_index {
            0 => len - 1,
            i => i - 1,
        };
        self.reset_item_selection();
    }

    fn reset_item_selection(&mut self) {
        let selected = if self.custom_item_count() > 0 { Some(0) } else { None };
        self.item_state.select(selected);
    }

    fn step(state: &mut TableState, len: usize, forward: bool) {
        if len == 0 {
            state.select(None);
            return;
        }
        let i = match state.selected() {
            Some(i) if forward => (i + 1) % len,
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        state.select(Some(i));
    }

    pub fn next(&mut self) {
        match self.current_page {
            Page::Categories => {
                let len = self.custom_item_count();
                Self::step(&mut self.item_state, len, true);
            }
            Page::Update => {
                let len = self.form.field_count();
                Self::step(&mut self.field_state, len, true);
            }
            Page::Overview => {}
        }
    }

    pub fn previous(&mut self) {
        match self.current_page {
            Page::Categories => {
                let len = self.custom_item_count();
                Self::step(&mut self.item_state, len, false);
            }
            Page::Update => {
                let len = self.form.field_count();
                Self::step(&mut self.field_state, len, false);
            }
            Page::Overview => {}
        }
    }

    /// Rebuild the form after a registry change, keeping typed values by key.
    fn refresh_form(&mut self) {
        let current = self.form.to_record();
        self.form = FormSchema::generate(self.dashboard.registry(), Some(&current));

        let len = self.form.field_count();
        match self.field_state.selected() {
            Some(i) if i >= len => self.field_state.select(len.checked_sub(1)),
            None if len > 0 => self.field_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn begin_add_item(&mut self) {
        if self.selected_category().is_some() {
            self.input = Some(InputMode::NewItem(String::new()));
        }
    }

    /// Start editing the selected field, pre-filled with its current value.
    pub fn begin_edit_field(&mut self) {
        let field = self
            .field_state
            .selected()
            .and_then(|i| self.form.fields().nth(i))
            .map(|field| (field.key.clone(), field.value.to_string()));

        if let Some((key, buffer)) = field {
            self.input = Some(InputMode::EditField { key, buffer });
        }
    }

    pub fn commit_input(&mut self) {
        let Some(input) = self.input.take() else {
            return;
        };

        match input {
            InputMode::NewItem(name) => {
                let Some(category) = self.selected_category_name() else {
                    return;
                };
                match self.dashboard.add_custom_item(&category, &name) {
                    Ok(true) => {
                        self.refresh_form();
                        let last = self.custom_item_count().checked_sub(1);
                        self.item_state.select(last);
                        self.status = Some(format!("Added \"{}\" to {}", name.trim(), category));
                    }
                    Ok(false) => self.status = Some("Item name cannot be empty".to_string()),
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            InputMode::EditField { key, buffer } => match self.form.set_input(&key, &buffer) {
                Ok(value) => self.status = Some(format!("{} = {}", key, format_amount(value))),
                Err(e) => self.status = Some(e.to_string()),
            },
        }
    }

    pub fn delete_selected_item(&mut self) {
        let category = self.selected_category_name();
        let (Some(category), Some(index)) = (category, self.item_state.selected()) else {
            self.status = Some("No custom item selected".to_string());
            return;
        };

        match self.dashboard.delete_custom_item(&category, index) {
            Ok(Some(name)) => {
                self.refresh_form();
                let len = self.custom_item_count();
                self.item_state.select(if len == 0 { None } else { Some(index.min(len - 1)) });
                self.status = Some(format!("Removed \"{}\" from {}", name, category));
            }
            Ok(None) => self.status = Some("No custom item selected".to_string()),
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn save(&mut self) {
        match self.dashboard.submit_form(&self.form) {
            Ok(snapshot) => {
                self.form = self.dashboard.form();
                self.status = Some(format!("Saved snapshot #{}", snapshot.id));
            }
            Err(e) => self.status = Some(format!("Save failed: {}", e)),
        }
    }

    /// Apply one key press. Returns false when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input.is_some() {
            match key.code {
                KeyCode::Enter => self.commit_input(),
                KeyCode::Esc => self.input = None,
                KeyCode::Backspace => {
                    if let Some(input) = self.input.as_mut() {
                        input.buffer_mut().pop();
                    }
                }
                KeyCode::Char(c) => {
                    if let Some(input) = self.input.as_mut() {
                        input.buffer_mut().push(c);
                    }
                }
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Right | KeyCode::Char('l') if self.current_page == Page::Categories => {
                self.next_category()
            }
            KeyCode::Left | KeyCode::Char('h') if self.current_page == Page::Categories => {
                self.previous_category()
            }
            KeyCode::Char('a') if self.current_page == Page::Categories => self.begin_add_item(),
            KeyCode::Char('d') if self.current_page == Page::Categories => {
                self.delete_selected_item()
            }
            KeyCode::Enter if self.current_page == Page::Update => self.begin_edit_field(),
            KeyCode::Char('s') if self.current_page == Page::Update => self.save(),
            _ => {}
        }

        true
    }
}

pub fn run_ui<S: SnapshotStore>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: SnapshotStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui<S: SnapshotStore>(f: &mut Frame, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Categories => render_categories(f, chunks[1], app),
        Page::Update => render_update(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let summary = app.dashboard.summary();

    let mut tab_spans = vec![];
    for (i, page) in [Page::Overview, Page::Categories, Page::Update].iter().enumerate() {
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
        format!("Net worth: {}", format_amount(summary.net_worth)),
        Style::default().fg(if summary.net_worth < 0.0 { Color::Red } else { Color::Green }),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

// ============================================================================
// OVERVIEW
// ============================================================================

fn render_overview<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let summary = app.dashboard.summary();
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let net_worth_color = if summary.net_worth < 0.0 { Color::Red } else { Color::Green };
    let net_worth_style = Style::default().fg(net_worth_color);
    let source = match app.dashboard.source() {
        RecordSource::Sample => "sample data",
        RecordSource::Stored => "stored snapshot",
    };

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total assets: ", label),
            Span::raw(format_amount(summary.total_assets)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Net worth:    ", label),
            Span::styled(format_amount(summary.net_worth), net_worth_style),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Liabilities:  ", label),
            Span::styled(format_amount(summary.liabilities_total), Style::default().fg(Color::Red)),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![Span::styled("  Source: ", label), Span::raw(source)]),
    ];

    if app.dashboard.is_showing_fallback() {
        content.push(Line::from(""));
        content.push(Line::from(Span::styled(
            "  Showing sample figures until data is saved",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Summary "),
    );
    f.render_widget(panel, chunks[0]);

    let graph = app.dashboard.graph();
    let tree = Paragraph::new(composition_lines(&graph))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Asset Composition "),
        );
    f.render_widget(tree, chunks[1]);
}

/// Text rendering of the flow graph: root, categories, then their items.
fn composition_lines(graph: &AssetGraph) -> Vec<Line<'static>> {
    if graph.is_empty() {
        return vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No data to display",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )),
        ];
    }

    let mut lines = vec![Line::from("")];
    let Some(root) = graph.node(0) else {
        return lines;
    };

    let root_total: f64 = graph.outgoing(root.id).map(|l| l.value).sum();
    lines.push(Line::from(vec![
        Span::styled(
            format!("  {} ", root.name),
            Style::default().fg(hex_color(root.role.color())).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format_amount(root_total)),
    ]));

    for link in graph.outgoing(root.id) {
        let Some(category) = graph.node(link.target) else {
            continue;
        };
        lines.push(Line::from(vec![
            Span::raw("  ├─ "),
            Span::styled(
                format!("{} ", category.name),
                Style::default().fg(hex_color(category.role.color())).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format_amount(link.value)),
        ]));

        for item_link in graph.outgoing(category.id) {
            if let Some(item) = graph.node(item_link.target) {
                lines.push(Line::from(vec![
                    Span::raw("  │   └─ "),
                    Span::styled(
                        format!("{} ", item.name),
                        Style::default().fg(hex_color(item.role.color())),
                    ),
                    Span::raw(format_amount(item_link.value)),
                ]));
            }
        }
    }

    lines
}

// ============================================================================
// CATEGORIES
// ============================================================================

fn render_categories<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let header = Row::new(["", "Category", "Items"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = app
        .dashboard
        .registry()
        .categories()
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.icon.clone()),
                Cell::from(c.name.clone()),
                Cell::from(c.item_count().to_string()),
            ])
        })
        .collect();

    let mut category_state = TableState::default();
    category_state.select(Some(app.category_index));

    let widths = [Constraint::Length(4), Constraint::Length(14), Constraint::Length(8)];
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Categories (←/→) "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");
    f.render_stateful_widget(table, chunks[0], &mut category_state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(chunks[1]);

    let (defaults, customs) = match app.selected_category() {
        Some(c) => (c.default_items().join(", "), c.custom_items().to_vec()),
        None => (String::new(), Vec::new()),
    };

    let default_panel = Paragraph::new(Line::from(vec![
        Span::styled(" Default: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(defaults, Style::default().fg(Color::DarkGray)),
    ]))
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::White)));
    f.render_widget(default_panel, right[0]);

    let custom_rows: Vec<Row> = customs
        .iter()
        .enumerate()
        .map(|(i, name)| Row::new(vec![Cell::from(format!("{}", i + 1)), Cell::from(name.clone())]))
        .collect();

    let custom_table = Table::new(custom_rows, [Constraint::Length(5), Constraint::Min(10)])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Custom items "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");
    f.render_stateful_widget(custom_table, right[1], &mut app.item_state);
}

// ============================================================================
// UPDATE
// ============================================================================

fn render_update<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let header = Row::new(["Category", "Item", "Key", "Amount"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1);

    let rows: Vec<Row> = app
        .form
        .groups
        .iter()
        .flat_map(|group| {
            group.fields.iter().map(move |field| {
                Row::new(vec![
                    Cell::from(format!("{} {}", group.icon, group.category)),
                    Cell::from(field.label.clone()),
                    Cell::from(field.key.clone()).style(Style::default().fg(Color::DarkGray)),
                    Cell::from(format_amount(field.value)),
                ])
            })
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(18),
            Constraint::Length(18),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Update asset data "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.field_state);
}

fn render_status_bar<S: SnapshotStore>(f: &mut Frame, area: Rect, app: &App<S>) {
    let key_style = Style::default().fg(Color::Yellow);

    let status_spans = match &app.input {
        Some(InputMode::NewItem(buffer)) => vec![
            Span::styled(" New item: ", Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}_", buffer)),
            Span::raw("  ("),
            Span::styled("Enter", key_style),
            Span::raw(" add, "),
            Span::styled("Esc", key_style),
            Span::raw(" cancel)"),
        ],
        Some(InputMode::EditField { key, buffer }) => vec![
            Span::styled(format!(" {}: ", key), Style::default().fg(Color::Cyan)),
            Span::raw(format!("{}_", buffer)),
            Span::raw("  ("),
            Span::styled("Enter", key_style),
            Span::raw(" set, "),
            Span::styled("Esc", key_style),
            Span::raw(" cancel)"),
        ],
        None => {
            let mut spans = vec![];
            if let Some(message) = &app.status {
                let style = Style::default().fg(Color::Green);
                spans.push(Span::styled(format!(" {} ", message), style));
                spans.push(Span::raw("| "));
            }
            match app.current_page {
                Page::Categories => {
                    spans.push(Span::styled("a", key_style));
                    spans.push(Span::raw(" Add | "));
                    spans.push(Span::styled("d", key_style));
                    spans.push(Span::raw(" Delete | "));
                }
                Page::Update => {
                    spans.push(Span::styled("Enter", key_style));
                    spans.push(Span::raw(" Edit | "));
                    spans.push(Span::styled("s", key_style));
                    spans.push(Span::raw(" Save | "));
                }
                Page::Overview => {}
            }
            spans.push(Span::styled("Tab", key_style));
            spans.push(Span::raw(" Page | "));
            spans.push(Span::styled("↑/↓", key_style));
            spans.push(Span::raw(" Nav | "));
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
            spans
        }
    };

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

/// `1465000.0` -> `1,465,000.00`
fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Gray;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}
