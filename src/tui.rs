use crate::api::{
    ApiClient, ComparisonMetrics, ComparisonRadar, ComparisonTimeseries, Drawdown,
    PortfolioRecord, PortfolioSummary, Timeseries, TopMovers,
};
use crate::charts::{
    downsample, heatmap_color, radar_axis_values, series_points, x_axis_labels, y_bounds,
    RADAR_AXES,
};
use crate::editor::AllocationEditor;
use crate::portfolio::{parse_allocation_display, weights_from_entries};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, Paragraph,
        Row, Table, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::collections::HashSet;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;
use tui_big_text::{BigText, PixelSize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    TabBar,
    NetWorth,
    SummaryMetrics,
    TopMovers,
    Cumulative,
    Drawdown,
    Heatmap,
    Help,
}

impl Component {
    /// Returns all available components
    pub fn all() -> Vec<Component> {
        vec![
            Component::TabBar,
            Component::NetWorth,
            Component::SummaryMetrics,
            Component::TopMovers,
            Component::Cumulative,
            Component::Drawdown,
            Component::Heatmap,
            Component::Help,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::TabBar => "tab_bar",
            Component::NetWorth => "net_worth",
            Component::SummaryMetrics => "summary_metrics",
            Component::TopMovers => "top_movers",
            Component::Cumulative => "cumulative",
            Component::Drawdown => "drawdown",
            Component::Heatmap => "heatmap",
            Component::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Component::TabBar => "Top navigation bar showing active tab",
            Component::NetWorth => "Headline net worth display",
            Component::SummaryMetrics => "Summary metric list",
            Component::TopMovers => "Per-asset return bars",
            Component::Cumulative => "Cumulative return chart",
            Component::Drawdown => "Drawdown chart",
            Component::Heatmap => "Monthly returns grid",
            Component::Help => "Keyboard shortcuts",
        }
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tab_bar" => Ok(Component::TabBar),
            "net_worth" => Ok(Component::NetWorth),
            "summary_metrics" => Ok(Component::SummaryMetrics),
            "top_movers" => Ok(Component::TopMovers),
            "cumulative" => Ok(Component::Cumulative),
            "drawdown" => Ok(Component::Drawdown),
            "heatmap" => Ok(Component::Heatmap),
            "help" => Ok(Component::Help),
            _ => Err(format!("Unknown component: '{s}'")),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DisabledComponents {
    disabled: HashSet<Component>,
}

impl DisabledComponents {
    pub fn new(disabled_list: Vec<String>) -> Self {
        let mut disabled = HashSet::new();

        for component_str in disabled_list {
            match Component::from_str(&component_str) {
                Ok(component) => {
                    disabled.insert(component);
                }
                Err(err) => eprintln!("Warning: {err}"),
            }
        }

        DisabledComponents { disabled }
    }

    #[cfg(test)]
    pub fn disable_component(&mut self, component: Component) {
        self.disabled.insert(component);
    }

    pub fn is_disabled(&self, component: Component) -> bool {
        self.disabled.contains(&component)
    }
}

fn format_currency(value: f64, currency: &str) -> String {
    let formatted_number = if value >= 1000.0 {
        format_with_commas(value)
    } else {
        format!("{value:.2}")
    };

    match currency {
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("${formatted_number}"),
        "EUR" => format!("{formatted_number} EUR"),
        "GBP" => format!("GBP {formatted_number}"),
        "CHF" => format!("{formatted_number} CHF"),
        _ => format!("{formatted_number} {currency}"),
    }
}

fn format_with_commas(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let parts: Vec<&str> = formatted.split('.').collect();
    let integer_part = parts[0];
    let decimal_part = parts.get(1).unwrap_or(&"00");

    let formatted_integer = integer_part
        .chars()
        .rev()
        .collect::<String>()
        .chars()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect::<String>();

    format!("{formatted_integer}.{decimal_part}")
}

fn format_signed_percent(value: f64) -> String {
    format!("{:+.2}%", value * 100.0)
}

/// A dashboard panel's data slot: each backend fetch lands independently
/// and a failed fetch degrades only its own panel.
#[derive(Debug, Clone)]
pub enum PanelData<T> {
    Loading,
    Ready(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashboardTab {
    Overview,
    Performance,
    Heatmap,
}

impl DashboardTab {
    fn title(self) -> &'static str {
        match self {
            DashboardTab::Overview => "Overview",
            DashboardTab::Performance => "Performance",
            DashboardTab::Heatmap => "Monthly Returns",
        }
    }

    fn all() -> &'static [DashboardTab] {
        &[
            DashboardTab::Overview,
            DashboardTab::Performance,
            DashboardTab::Heatmap,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompareTab {
    Metrics,
    Cumulative,
    RiskReturn,
}

impl CompareTab {
    fn title(self) -> &'static str {
        match self {
            CompareTab::Metrics => "Metrics",
            CompareTab::Cumulative => "Cumulative",
            CompareTab::RiskReturn => "Risk / Return",
        }
    }

    fn all() -> &'static [CompareTab] {
        &[
            CompareTab::Metrics,
            CompareTab::Cumulative,
            CompareTab::RiskReturn,
        ]
    }
}

/// Page mode, resolved exactly once from the subcommand before the
/// terminal is touched. Every screen knows its data needs up front; no
/// probing for what happens to be on screen.
pub enum Screen {
    Dashboard {
        client: ApiClient,
        record: PortfolioRecord,
    },
    Compare {
        client: ApiClient,
        record_a: PortfolioRecord,
        record_b: PortfolioRecord,
    },
    Editor {
        editor: AllocationEditor,
    },
}

/// What the TUI session produced. Only the editor screen hands anything
/// back: the validated form fields for the caller to POST.
pub enum TuiOutcome {
    Closed,
    Submitted(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub currency: String,
    pub start_date: String,
    pub initial_investment: f64,
    pub disabled_components: Vec<String>,
}

enum DashboardEvent {
    Summary(Result<PortfolioSummary, String>),
    Series(Result<Timeseries, String>),
    Drawdown(Result<Drawdown, String>),
    Movers(Result<TopMovers, String>),
}

struct DashboardApp {
    portfolio_name: String,
    current_tab: DashboardTab,
    summary: PanelData<PortfolioSummary>,
    timeseries: PanelData<Timeseries>,
    drawdown: PanelData<Drawdown>,
    top_movers: PanelData<TopMovers>,
    currency: String,
    disabled_components: DisabledComponents,
    should_quit: bool,
    rx: mpsc::UnboundedReceiver<DashboardEvent>,
}

impl DashboardApp {
    fn try_receive(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                DashboardEvent::Summary(result) => self.summary = into_panel(result),
                DashboardEvent::Series(result) => self.timeseries = into_panel(result),
                DashboardEvent::Drawdown(result) => self.drawdown = into_panel(result),
                DashboardEvent::Movers(result) => self.top_movers = into_panel(result),
            }
        }
    }

    fn next_tab(&mut self) {
        let tabs = DashboardTab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    fn previous_tab(&mut self) {
        let tabs = DashboardTab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }
}

fn into_panel<T>(result: Result<T, String>) -> PanelData<T> {
    match result {
        Ok(value) => PanelData::Ready(value),
        Err(message) => PanelData::Failed(message),
    }
}

enum CompareEvent {
    Summaries(Result<(PortfolioSummary, PortfolioSummary), String>),
    Series(Result<ComparisonTimeseries, String>),
    Metrics(Result<ComparisonMetrics, String>),
    Radar(Result<ComparisonRadar, String>),
}

struct CompareApp {
    name_a: String,
    name_b: String,
    current_tab: CompareTab,
    summaries: PanelData<(PortfolioSummary, PortfolioSummary)>,
    timeseries: PanelData<ComparisonTimeseries>,
    metrics: PanelData<ComparisonMetrics>,
    radar: PanelData<ComparisonRadar>,
    should_quit: bool,
    rx: mpsc::UnboundedReceiver<CompareEvent>,
}

impl CompareApp {
    fn try_receive(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                CompareEvent::Summaries(result) => self.summaries = into_panel(result),
                CompareEvent::Series(result) => self.timeseries = into_panel(result),
                CompareEvent::Metrics(result) => self.metrics = into_panel(result),
                CompareEvent::Radar(result) => self.radar = into_panel(result),
            }
        }
    }

    fn next_tab(&mut self) {
        let tabs = CompareTab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    fn previous_tab(&mut self) {
        let tabs = CompareTab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum EditorMode {
    Browse,
    EditValue,
    EditName,
}

struct EditorApp {
    editor: AllocationEditor,
    cursor: usize,
    mode: EditorMode,
    input: String,
    error_message: Option<String>,
    outcome: Option<Vec<(String, String)>>,
    should_quit: bool,
    flash_state: bool,
}

impl EditorApp {
    fn new(editor: AllocationEditor) -> Self {
        EditorApp {
            editor,
            cursor: 0,
            mode: EditorMode::Browse,
            input: String::new(),
            error_message: None,
            outcome: None,
            should_quit: false,
            flash_state: false,
        }
    }

    fn cursor_code(&self) -> Option<String> {
        self.editor
            .catalog()
            .get(self.cursor)
            .map(|a| a.code.clone())
    }

    fn select_next(&mut self) {
        if self.cursor + 1 < self.editor.catalog().len() {
            self.cursor += 1;
        }
    }

    fn select_previous(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(code) = self.cursor_code() else {
            return;
        };
        if self.editor.is_selected(&code) {
            self.editor.deselect_asset(&code);
        } else {
            self.editor.select_asset(&code);
        }
    }

    fn enter_value_mode(&mut self) {
        let Some(code) = self.cursor_code() else {
            return;
        };
        if let Some(value) = self.editor.allocation(&code) {
            self.mode = EditorMode::EditValue;
            self.input = value.to_string();
        }
    }

    fn enter_name_mode(&mut self) {
        self.mode = EditorMode::EditName;
        self.input = self.editor.name().to_string();
    }

    fn exit_input_mode(&mut self) {
        self.mode = EditorMode::Browse;
        self.input.clear();
    }

    fn commit_input(&mut self) {
        match self.mode {
            EditorMode::EditValue => {
                if let Some(code) = self.cursor_code() {
                    let raw = self.input.clone();
                    self.editor.set_allocation_input(&code, &raw);
                }
            }
            EditorMode::EditName => {
                let name = self.input.clone();
                self.editor.set_name(&name);
            }
            EditorMode::Browse => {}
        }
        self.exit_input_mode();
    }

    // Validation gates the submit; on failure nothing leaves the editor.
    fn submit(&mut self) {
        match self.editor.validate_for_submit() {
            Ok(()) => {
                self.outcome = Some(self.editor.form_fields());
                self.should_quit = true;
            }
            Err(err) => {
                self.error_message = Some(err.to_string());
            }
        }
    }
}

pub async fn run(screen: Screen, settings: &ViewSettings) -> eyre::Result<TuiOutcome> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = match screen {
        Screen::Dashboard { client, record } => {
            run_dashboard(&mut terminal, client, record, settings)
                .await
                .map(|_| TuiOutcome::Closed)
        }
        Screen::Compare {
            client,
            record_a,
            record_b,
        } => run_compare(&mut terminal, client, record_a, record_b, settings)
            .await
            .map(|_| TuiOutcome::Closed),
        Screen::Editor { editor } => run_editor(&mut terminal, editor).await.map(|fields| {
            match fields {
                Some(fields) => TuiOutcome::Submitted(fields),
                None => TuiOutcome::Closed,
            }
        }),
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(res?)
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

async fn run_dashboard(
    terminal: &mut Term,
    client: ApiClient,
    record: PortfolioRecord,
    settings: &ViewSettings,
) -> io::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let weights = weights_from_entries(&parse_allocation_display(&record.allocation));
    let start_date = settings.start_date.clone();
    let initial = settings.initial_investment;

    // One task per panel so a slow endpoint never holds back the others.
    {
        let client = client.clone();
        let weights = weights.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.portfolio_summary(&weights, &start_date, initial).await;
            let _ = tx.send(DashboardEvent::Summary(result.map_err(|e| e.to_string())));
        });
    }
    {
        let client = client.clone();
        let weights = weights.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.timeseries(&weights, &start_date, initial).await;
            let _ = tx.send(DashboardEvent::Series(result.map_err(|e| e.to_string())));
        });
    }
    {
        let client = client.clone();
        let weights = weights.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client.drawdown(&weights, &start_date, initial).await;
            let _ = tx.send(DashboardEvent::Drawdown(result.map_err(|e| e.to_string())));
        });
    }
    {
        let client = client.clone();
        let weights = weights.clone();
        tokio::spawn(async move {
            let result = client.top_movers(&weights).await;
            let _ = tx.send(DashboardEvent::Movers(result.map_err(|e| e.to_string())));
        });
    }

    let mut app = DashboardApp {
        portfolio_name: record.portfolio_name.clone(),
        current_tab: DashboardTab::Overview,
        summary: PanelData::Loading,
        timeseries: PanelData::Loading,
        drawdown: PanelData::Loading,
        top_movers: PanelData::Loading,
        currency: settings.currency.clone(),
        disabled_components: DisabledComponents::new(settings.disabled_components.clone()),
        should_quit: false,
        rx,
    };

    loop {
        terminal.draw(|f| ui_dashboard(f, &app))?;

        app.try_receive();

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                            app.previous_tab()
                        }
                        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => app.next_tab(),
                        KeyCode::Char('1') => app.current_tab = DashboardTab::Overview,
                        KeyCode::Char('2') => app.current_tab = DashboardTab::Performance,
                        KeyCode::Char('3') => app.current_tab = DashboardTab::Heatmap,
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui_dashboard(f: &mut Frame, app: &DashboardApp) {
    let show_tab_bar = !app.disabled_components.is_disabled(Component::TabBar);
    let chunks = if show_tab_bar {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(f.area())
            .to_vec()
    } else {
        vec![f.area()]
    };

    if show_tab_bar {
        let tab_titles: Vec<Line> = DashboardTab::all()
            .iter()
            .map(|t| {
                let style = if *t == app.current_tab {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(t.title(), style))
            })
            .collect();

        let tabs = Tabs::new(tab_titles)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Portfolio: {}", app.portfolio_name)),
            )
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow))
            .select(
                DashboardTab::all()
                    .iter()
                    .position(|&t| t == app.current_tab)
                    .unwrap_or(0),
            );

        f.render_widget(tabs, chunks[0]);
    }

    let content_area = if show_tab_bar { chunks[1] } else { chunks[0] };

    match app.current_tab {
        DashboardTab::Overview => render_overview(f, content_area, app),
        DashboardTab::Performance => render_performance(f, content_area, app),
        DashboardTab::Heatmap => render_heatmap(f, content_area, app),
    }
}

fn render_overview(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let mut constraints = Vec::new();
    if !app.disabled_components.is_disabled(Component::NetWorth) {
        constraints.push(Constraint::Length(7));
    }
    if !app.disabled_components.is_disabled(Component::SummaryMetrics)
        || !app.disabled_components.is_disabled(Component::TopMovers)
    {
        constraints.push(Constraint::Min(0));
    }
    if !app.disabled_components.is_disabled(Component::Help) {
        constraints.push(Constraint::Length(3));
    }

    if constraints.is_empty() {
        let placeholder = Paragraph::new("All overview components are disabled")
            .block(Block::default().borders(Borders::ALL).title("Overview"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, area);
        return;
    }

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut chunk_index = 0;

    if !app.disabled_components.is_disabled(Component::NetWorth) {
        render_net_worth(f, main_chunks[chunk_index], app);
        chunk_index += 1;
    }

    let show_metrics = !app.disabled_components.is_disabled(Component::SummaryMetrics);
    let show_movers = !app.disabled_components.is_disabled(Component::TopMovers);
    if show_metrics || show_movers {
        let middle = main_chunks[chunk_index];
        if show_metrics && show_movers {
            let halves = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(middle);
            render_summary_metrics(f, halves[0], app);
            render_top_movers(f, halves[1], app);
        } else if show_metrics {
            render_summary_metrics(f, middle, app);
        } else {
            render_top_movers(f, middle, app);
        }
        chunk_index += 1;
    }

    if !app.disabled_components.is_disabled(Component::Help) {
        let help_text =
            Paragraph::new("Navigation: h/l (tabs) | 1-3 (direct) | q (quit)")
                .block(Block::default().borders(Borders::ALL).title("Help"))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center);
        f.render_widget(help_text, main_chunks[chunk_index]);
    }
}

fn render_net_worth(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Net Worth ({})", app.currency))
        .title_alignment(Alignment::Center);
    f.render_widget(&block, area);
    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });

    match &app.summary {
        PanelData::Ready(summary) => {
            let text = format_currency(summary.net_worth, &app.currency);
            let big_text = BigText::builder()
                .pixel_size(PixelSize::Quadrant)
                .style(
                    Style::default()
                        .fg(if summary.profit >= 0.0 {
                            Color::Green
                        } else {
                            Color::Red
                        })
                        .add_modifier(Modifier::BOLD),
                )
                .lines(vec![text.clone().into()])
                .build();

            let big_text_width = text.len() as u16 * 4;
            let centered_area = if big_text_width < inner.width {
                let margin = (inner.width - big_text_width) / 2;
                Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Length(margin),
                        Constraint::Min(0),
                        Constraint::Length(margin),
                    ])
                    .split(inner)[1]
            } else {
                inner
            };
            f.render_widget(big_text, centered_area);
        }
        PanelData::Loading => render_panel_loading(f, inner),
        PanelData::Failed(message) => render_panel_error(f, inner, message),
    }
}

fn render_summary_metrics(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default().borders(Borders::ALL).title("Summary");

    match &app.summary {
        PanelData::Ready(summary) => {
            let signed = |v: f64| {
                if v >= 0.0 {
                    Color::Green
                } else {
                    Color::Red
                }
            };
            let row = |label: &str, value: String, color: Color| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{label:<16}"), Style::default().fg(Color::White)),
                    Span::styled(format!("{value:>14}"), Style::default().fg(color)),
                ]))
            };

            let items = vec![
                row(
                    "Initial",
                    format_currency(summary.initial, &app.currency),
                    Color::White,
                ),
                row(
                    "Profit",
                    format_currency(summary.profit, &app.currency),
                    signed(summary.profit),
                ),
                row(
                    "Total Return",
                    format_signed_percent(summary.cumulative_return),
                    signed(summary.cumulative_return),
                ),
                row(
                    "CAGR",
                    format_signed_percent(summary.cagr),
                    signed(summary.cagr),
                ),
                row(
                    "Volatility",
                    format!("{:.2}%", summary.volatility * 100.0),
                    Color::Cyan,
                ),
                row(
                    "Max Drawdown",
                    format!("{:.2}%", summary.max_drawdown * 100.0),
                    Color::Red,
                ),
                row(
                    "Longest DD",
                    format!("{} days", summary.longest_dd),
                    Color::White,
                ),
            ];

            let list = List::new(items)
                .block(block)
                .style(Style::default().fg(Color::White));
            f.render_widget(list, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

// Horizontal signed bars; the BarChart widget cannot show losses.
fn render_top_movers(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default().borders(Borders::ALL).title("Top Movers");

    match &app.top_movers {
        PanelData::Ready(movers) => {
            let max_abs = movers
                .values
                .iter()
                .map(|v| v.abs())
                .fold(0.0_f64, f64::max)
                .max(f64::EPSILON);
            let bar_space = area.width.saturating_sub(24) as f64;

            let items: Vec<ListItem> = movers
                .labels
                .iter()
                .zip(&movers.values)
                .map(|(label, value)| {
                    let color = if *value >= 0.0 {
                        Color::Green
                    } else {
                        Color::Red
                    };
                    let width = ((value.abs() / max_abs) * bar_space).round() as usize;
                    ListItem::new(Line::from(vec![
                        Span::styled(format!("{label:<10}"), Style::default().fg(Color::White)),
                        Span::styled("▇".repeat(width.max(1)), Style::default().fg(color)),
                        Span::styled(format!(" {value:+.2}%"), Style::default().fg(color)),
                    ]))
                })
                .collect();

            let list = List::new(items).block(block);
            f.render_widget(list, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

fn render_performance(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let show_cumulative = !app.disabled_components.is_disabled(Component::Cumulative);
    let show_drawdown = !app.disabled_components.is_disabled(Component::Drawdown);

    if !show_cumulative && !show_drawdown {
        let placeholder = Paragraph::new("All performance components are disabled")
            .block(Block::default().borders(Borders::ALL).title("Performance"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, area);
        return;
    }

    let chunks = if show_cumulative && show_drawdown {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area)
            .to_vec()
    } else {
        vec![area]
    };

    let mut idx = 0;
    if show_cumulative {
        render_cumulative_chart(f, chunks[idx], app);
        idx += 1;
    }
    if show_drawdown {
        render_drawdown_chart(f, chunks[idx], app);
    }
}

fn render_cumulative_chart(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cumulative Return vs. SPY");

    match &app.timeseries {
        PanelData::Ready(ts) => {
            let max_points = (area.width as usize).saturating_sub(4).max(16);
            let strategy = downsample(&ts.strategy, max_points);
            let benchmark = downsample(&ts.benchmark, max_points);
            let strategy_points = series_points(&strategy);
            let benchmark_points = series_points(&benchmark);

            let (y_min, y_max) = y_bounds(&[&strategy, &benchmark]);
            let x_max = strategy_points.len().max(benchmark_points.len()) as f64 - 1.0;
            let x_labels: Vec<Span> = x_axis_labels(&ts.labels)
                .into_iter()
                .map(Span::from)
                .collect();

            let datasets = vec![
                Dataset::default()
                    .name("Your Strategy")
                    .data(&strategy_points)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(Color::Blue)),
                Dataset::default()
                    .name("SPY Benchmark")
                    .data(&benchmark_points)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(Color::Yellow)),
            ];

            let chart = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .bounds([0.0, x_max.max(1.0)])
                        .labels(x_labels)
                        .style(Style::default().fg(Color::Gray)),
                )
                .y_axis(
                    Axis::default()
                        .bounds([y_min, y_max])
                        .labels(vec![
                            Span::from(format!("{y_min:.2}")),
                            Span::from(format!("{:.2}", (y_min + y_max) / 2.0)),
                            Span::from(format!("{y_max:.2}")),
                        ])
                        .style(Style::default().fg(Color::Gray)),
                );

            f.render_widget(chart, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

fn render_drawdown_chart(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default().borders(Borders::ALL).title("Drawdown");

    match &app.drawdown {
        PanelData::Ready(drawdown) => {
            let max_points = (area.width as usize).saturating_sub(4).max(16);
            let percents: Vec<f64> = drawdown.values.iter().map(|v| v * 100.0).collect();
            let sampled = downsample(&percents, max_points);
            let points = series_points(&sampled);

            let (y_min, _) = y_bounds(&[&sampled]);
            let x_labels: Vec<Span> = x_axis_labels(&drawdown.labels)
                .into_iter()
                .map(Span::from)
                .collect();

            let datasets = vec![Dataset::default()
                .name("Drawdown")
                .data(&points)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Red))];

            let chart = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .bounds([0.0, (points.len() as f64 - 1.0).max(1.0)])
                        .labels(x_labels)
                        .style(Style::default().fg(Color::Gray)),
                )
                .y_axis(
                    Axis::default()
                        .bounds([y_min, 0.0])
                        .labels(vec![
                            Span::from(format!("{y_min:.1}%")),
                            Span::from(format!("{:.1}%", y_min / 2.0)),
                            Span::from("0%"),
                        ])
                        .style(Style::default().fg(Color::Gray)),
                );

            f.render_widget(chart, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

fn render_heatmap(f: &mut Frame, area: Rect, app: &DashboardApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Monthly Returns Heatmap");

    if app.disabled_components.is_disabled(Component::Heatmap) {
        let placeholder = Paragraph::new("Heatmap is disabled")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(placeholder, area);
        return;
    }

    match &app.timeseries {
        PanelData::Ready(ts) => {
            let monthly = &ts.monthly_returns;
            let mut header_cells = vec![Cell::from("Year").style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )];
            header_cells.extend(monthly.labels.iter().map(|m| {
                Cell::from(m.as_str()).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            }));
            let header = Row::new(header_cells).height(1).bottom_margin(1);

            let rows = monthly.datasets.iter().map(|year_row| {
                let mut cells = vec![Cell::from(year_row.year.to_string())
                    .style(Style::default().fg(Color::White))];
                cells.extend(year_row.values.iter().map(|value| {
                    Cell::from(format!("{:+.1}", value * 100.0))
                        .style(Style::default().fg(heatmap_color(*value)))
                }));
                Row::new(cells).height(1)
            });

            let widths = vec![Constraint::Length(6); monthly.labels.len() + 1];

            let table = Table::new(rows, widths)
                .header(header)
                .block(block)
                .style(Style::default().fg(Color::White));

            f.render_widget(table, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

async fn run_compare(
    terminal: &mut Term,
    client: ApiClient,
    record_a: PortfolioRecord,
    record_b: PortfolioRecord,
    settings: &ViewSettings,
) -> io::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let weights_a = weights_from_entries(&parse_allocation_display(&record_a.allocation));
    let weights_b = weights_from_entries(&parse_allocation_display(&record_b.allocation));
    let start_date = settings.start_date.clone();
    let initial = settings.initial_investment;

    {
        let client = client.clone();
        let weights_a = weights_a.clone();
        let weights_b = weights_b.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            // the metrics panel needs both summaries, so they land as one
            let (a, b) = tokio::join!(
                client.portfolio_summary(&weights_a, &start_date, initial),
                client.portfolio_summary(&weights_b, &start_date, initial),
            );
            let result = a.and_then(|a| b.map(|b| (a, b))).map_err(|e| e.to_string());
            let _ = tx.send(CompareEvent::Summaries(result));
        });
    }
    {
        let client = client.clone();
        let weights_a = weights_a.clone();
        let weights_b = weights_b.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client
                .comparison_timeseries(&weights_a, &weights_b, &start_date, initial)
                .await;
            let _ = tx.send(CompareEvent::Series(result.map_err(|e| e.to_string())));
        });
    }
    {
        let client = client.clone();
        let weights_a = weights_a.clone();
        let weights_b = weights_b.clone();
        let start_date = start_date.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = client
                .comparison_metrics(&weights_a, &weights_b, &start_date, initial)
                .await;
            let _ = tx.send(CompareEvent::Metrics(result.map_err(|e| e.to_string())));
        });
    }
    {
        let client = client.clone();
        tokio::spawn(async move {
            let result = client
                .comparison_radar(&weights_a, &weights_b, &start_date, initial)
                .await;
            let _ = tx.send(CompareEvent::Radar(result.map_err(|e| e.to_string())));
        });
    }

    let mut app = CompareApp {
        name_a: record_a.portfolio_name.clone(),
        name_b: record_b.portfolio_name.clone(),
        current_tab: CompareTab::Metrics,
        summaries: PanelData::Loading,
        timeseries: PanelData::Loading,
        metrics: PanelData::Loading,
        radar: PanelData::Loading,
        should_quit: false,
        rx,
    };

    loop {
        terminal.draw(|f| ui_compare(f, &app))?;

        app.try_receive();

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => {
                            app.previous_tab()
                        }
                        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => app.next_tab(),
                        KeyCode::Char('1') => app.current_tab = CompareTab::Metrics,
                        KeyCode::Char('2') => app.current_tab = CompareTab::Cumulative,
                        KeyCode::Char('3') => app.current_tab = CompareTab::RiskReturn,
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui_compare(f: &mut Frame, app: &CompareApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    let tab_titles: Vec<Line> = CompareTab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.current_tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(t.title(), style))
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Compare: {} vs. {}",
            app.name_a, app.name_b
        )))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow))
        .select(
            CompareTab::all()
                .iter()
                .position(|&t| t == app.current_tab)
                .unwrap_or(0),
        );

    f.render_widget(tabs, chunks[0]);

    match app.current_tab {
        CompareTab::Metrics => render_compare_metrics(f, chunks[1], app),
        CompareTab::Cumulative => render_compare_cumulative(f, chunks[1], app),
        CompareTab::RiskReturn => render_risk_return(f, chunks[1], app),
    }
}

fn render_compare_metrics(f: &mut Frame, area: Rect, app: &CompareApp) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // left: summary metrics A vs B
    let block = Block::default().borders(Borders::ALL).title("Summary");
    match &app.summaries {
        PanelData::Ready((a, b)) => {
            let header = Row::new(vec![
                Cell::from("Metric").style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(app.name_a.as_str()).style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                ),
                Cell::from(app.name_b.as_str()).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            ])
            .height(1)
            .bottom_margin(1);

            let signed_cell = |v: f64, text: String| {
                Cell::from(text).style(Style::default().fg(if v >= 0.0 {
                    Color::Green
                } else {
                    Color::Red
                }))
            };

            let rows = vec![
                Row::new(vec![
                    Cell::from("Net Worth"),
                    Cell::from(format!("{:.2}", a.net_worth)),
                    Cell::from(format!("{:.2}", b.net_worth)),
                ]),
                Row::new(vec![
                    Cell::from("Profit"),
                    signed_cell(a.profit, format!("{:.2}", a.profit)),
                    signed_cell(b.profit, format!("{:.2}", b.profit)),
                ]),
                Row::new(vec![
                    Cell::from("Total Return"),
                    signed_cell(a.cumulative_return, format_signed_percent(a.cumulative_return)),
                    signed_cell(b.cumulative_return, format_signed_percent(b.cumulative_return)),
                ]),
                Row::new(vec![
                    Cell::from("CAGR"),
                    signed_cell(a.cagr, format_signed_percent(a.cagr)),
                    signed_cell(b.cagr, format_signed_percent(b.cagr)),
                ]),
                Row::new(vec![
                    Cell::from("Volatility"),
                    Cell::from(format!("{:.2}%", a.volatility * 100.0)),
                    Cell::from(format!("{:.2}%", b.volatility * 100.0)),
                ]),
                Row::new(vec![
                    Cell::from("Max Drawdown"),
                    Cell::from(format!("{:.2}%", a.max_drawdown * 100.0))
                        .style(Style::default().fg(Color::Red)),
                    Cell::from(format!("{:.2}%", b.max_drawdown * 100.0))
                        .style(Style::default().fg(Color::Red)),
                ]),
                Row::new(vec![
                    Cell::from("Longest DD"),
                    Cell::from(format!("{} days", a.longest_dd)),
                    Cell::from(format!("{} days", b.longest_dd)),
                ]),
            ];

            let table = Table::new(
                rows,
                [
                    Constraint::Length(14),
                    Constraint::Min(10),
                    Constraint::Min(10),
                ],
            )
            .header(header)
            .block(block)
            .style(Style::default().fg(Color::White));
            f.render_widget(table, halves[0]);
        }
        PanelData::Loading => {
            f.render_widget(&block, halves[0]);
            render_panel_loading(f, halves[0].inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, halves[0]);
            render_panel_error(
                f,
                halves[0].inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }

    // right: radar axes as paired 0-100 bars
    let block = Block::default().borders(Borders::ALL).title("Radar");
    match &app.radar {
        PanelData::Ready(radar) => {
            let values_a = radar_axis_values(&radar.portfolio_a);
            let values_b = radar_axis_values(&radar.portfolio_b);
            let bar_space = (halves[1].width.saturating_sub(22) / 2).max(4) as f64;

            let mut items = Vec::new();
            for (i, axis) in RADAR_AXES.iter().enumerate() {
                let a = values_a.get(i).copied().unwrap_or(0.0);
                let b = values_b.get(i).copied().unwrap_or(0.0);
                let width_a = ((a / 100.0) * bar_space).round() as usize;
                let width_b = ((b / 100.0) * bar_space).round() as usize;
                items.push(ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<14}", axis.label),
                        Style::default().fg(Color::White),
                    ),
                    Span::styled("▇".repeat(width_a.max(1)), Style::default().fg(Color::Blue)),
                    Span::raw(" "),
                    Span::styled(
                        "▇".repeat(width_b.max(1)),
                        Style::default().fg(Color::Yellow),
                    ),
                ])));
            }
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!("{:<14}", ""), Style::default()),
                Span::styled(app.name_a.as_str(), Style::default().fg(Color::Blue)),
                Span::raw(" / "),
                Span::styled(app.name_b.as_str(), Style::default().fg(Color::Yellow)),
            ])));

            let list = List::new(items).block(block);
            f.render_widget(list, halves[1]);
        }
        PanelData::Loading => {
            f.render_widget(&block, halves[1]);
            render_panel_loading(f, halves[1].inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, halves[1]);
            render_panel_error(
                f,
                halves[1].inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

fn render_compare_cumulative(f: &mut Frame, area: Rect, app: &CompareApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cumulative Value");

    match &app.timeseries {
        PanelData::Ready(ts) => {
            let max_points = (area.width as usize).saturating_sub(4).max(16);
            let series_a = downsample(&ts.portfolio_a, max_points);
            let series_b = downsample(&ts.portfolio_b, max_points);
            let points_a = series_points(&series_a);
            let points_b = series_points(&series_b);

            let (y_min, y_max) = y_bounds(&[&series_a, &series_b]);
            let x_labels: Vec<Span> = x_axis_labels(&ts.labels)
                .into_iter()
                .map(Span::from)
                .collect();

            let datasets = vec![
                Dataset::default()
                    .name(app.name_a.as_str())
                    .data(&points_a)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(Color::Blue)),
                Dataset::default()
                    .name(app.name_b.as_str())
                    .data(&points_b)
                    .marker(symbols::Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(Color::Yellow)),
            ];

            let chart = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .bounds([0.0, (points_a.len().max(points_b.len()) as f64 - 1.0).max(1.0)])
                        .labels(x_labels)
                        .style(Style::default().fg(Color::Gray)),
                )
                .y_axis(
                    Axis::default()
                        .bounds([y_min, y_max])
                        .labels(vec![
                            Span::from(format!("{y_min:.2}")),
                            Span::from(format!("{:.2}", (y_min + y_max) / 2.0)),
                            Span::from(format!("{y_max:.2}")),
                        ])
                        .style(Style::default().fg(Color::Gray)),
                );

            f.render_widget(chart, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

// Volatility on x, CAGR on y; one point per portfolio plus the S&P 500.
fn render_risk_return(f: &mut Frame, area: Rect, app: &CompareApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Risk (Volatility %) vs. Return (CAGR %)");

    match &app.metrics {
        PanelData::Ready(metrics) => {
            let summary = &metrics.summary;
            let points = [
                (app.name_a.as_str(), summary.portfolio_a, Color::Blue),
                (app.name_b.as_str(), summary.portfolio_b, Color::Yellow),
                ("S&P 500", summary.portfolio_spy, Color::Gray),
            ];

            let coords: Vec<[(f64, f64); 1]> = points
                .iter()
                .map(|(_, p, _)| [(p.volatility * 100.0, p.cagr * 100.0)])
                .collect();

            let risks: Vec<f64> = coords.iter().map(|c| c[0].0).collect();
            let returns: Vec<f64> = coords.iter().map(|c| c[0].1).collect();
            // pad the plot and keep the origin in view
            let (x_min, x_max) = y_bounds(&[&risks]);
            let (y_min, y_max) = y_bounds(&[&returns]);
            let x_min = (x_min - 1.0).max(0.0);
            let y_min = (y_min - 1.0).min(0.0);

            let datasets: Vec<Dataset> = points
                .iter()
                .zip(&coords)
                .map(|((name, _, color), data)| {
                    Dataset::default()
                        .name(*name)
                        .data(data)
                        .marker(symbols::Marker::Dot)
                        .graph_type(GraphType::Scatter)
                        .style(Style::default().fg(*color))
                })
                .collect();

            let chart = Chart::new(datasets)
                .block(block)
                .x_axis(
                    Axis::default()
                        .title("Volatility %")
                        .bounds([x_min, x_max + 1.0])
                        .labels(vec![
                            Span::from(format!("{x_min:.1}")),
                            Span::from(format!("{:.1}", x_max + 1.0)),
                        ])
                        .style(Style::default().fg(Color::Gray)),
                )
                .y_axis(
                    Axis::default()
                        .title("CAGR %")
                        .bounds([y_min, y_max + 1.0])
                        .labels(vec![
                            Span::from(format!("{y_min:.1}")),
                            Span::from(format!("{:.1}", y_max + 1.0)),
                        ])
                        .style(Style::default().fg(Color::Gray)),
                );

            f.render_widget(chart, area);
        }
        PanelData::Loading => {
            f.render_widget(&block, area);
            render_panel_loading(f, area.inner(ratatui::layout::Margin {
                horizontal: 1,
                vertical: 1,
            }));
        }
        PanelData::Failed(message) => {
            f.render_widget(&block, area);
            render_panel_error(
                f,
                area.inner(ratatui::layout::Margin {
                    horizontal: 1,
                    vertical: 1,
                }),
                message,
            );
        }
    }
}

async fn run_editor(
    terminal: &mut Term,
    editor: AllocationEditor,
) -> io::Result<Option<Vec<(String, String)>>> {
    let mut app = EditorApp::new(editor);

    loop {
        app.flash_state = !app.flash_state;
        terminal.draw(|f| ui_editor(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // any key dismisses a validation popup first
                    if app.error_message.is_some() {
                        app.error_message = None;
                        continue;
                    }
                    match app.mode {
                        EditorMode::Browse => match key.code {
                            KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                            KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                            KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
                            KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                            KeyCode::Char('e') => app.enter_value_mode(),
                            KeyCode::Char('n') => app.enter_name_mode(),
                            KeyCode::Char('s') => app.submit(),
                            _ => {}
                        },
                        EditorMode::EditValue => match key.code {
                            KeyCode::Esc => app.exit_input_mode(),
                            KeyCode::Enter => app.commit_input(),
                            KeyCode::Backspace => {
                                app.input.pop();
                            }
                            KeyCode::Char(c) => {
                                if c.is_ascii_digit() && app.input.len() < 3 {
                                    app.input.push(c);
                                }
                            }
                            _ => {}
                        },
                        EditorMode::EditName => match key.code {
                            KeyCode::Esc => app.exit_input_mode(),
                            KeyCode::Enter => app.commit_input(),
                            KeyCode::Backspace => {
                                app.input.pop();
                            }
                            KeyCode::Char(c) => app.input.push(c),
                            _ => {}
                        },
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(app.outcome)
}

fn ui_editor(f: &mut Frame, app: &EditorApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    // name + total header
    let total = app.editor.total_allocation();
    let total_style = if total == 100 {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };
    let name_display = if app.editor.name().is_empty() {
        Span::styled("<unnamed>", Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(app.editor.name(), Style::default().fg(Color::White))
    };
    let header = Paragraph::new(Line::from(vec![
        Span::raw("Name: "),
        name_display,
        Span::raw("    Total: "),
        Span::styled(format!("{total}%"), total_style),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Portfolio Editor"),
    );
    f.render_widget(header, chunks[0]);

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_asset_cards(f, halves[0], app);
    render_allocation_panel(f, halves[1], app);

    let help_text = match app.mode {
        EditorMode::Browse => {
            "j/k (move) | Space (select/deselect) | e (edit %) | n (name) | s (submit) | q (quit)"
        }
        EditorMode::EditValue | EditorMode::EditName => "Enter (save) | Esc (cancel)",
    };
    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);

    match app.mode {
        EditorMode::EditValue => render_value_dialog(f, app),
        EditorMode::EditName => render_name_dialog(f, app),
        EditorMode::Browse => {}
    }

    if let Some(error) = &app.error_message {
        render_error_popup(f, error);
    }
}

fn render_asset_cards(f: &mut Frame, area: Rect, app: &EditorApp) {
    let items: Vec<ListItem> = app
        .editor
        .catalog()
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let selected = app.editor.is_selected(&asset.code);
            let disabled = app.editor.is_card_disabled(&asset.code);

            let marker = if selected { "●" } else { "○" };
            let style = if disabled {
                Style::default().fg(Color::DarkGray)
            } else if selected {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };

            let row_style = if i == app.cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{marker} "), style),
                Span::styled(format!("{:<10}", asset.code), style),
                Span::styled(
                    format!("{} ({})", asset.name, asset.company),
                    style.add_modifier(Modifier::DIM),
                ),
            ]))
            .style(row_style)
        })
        .collect();

    let title = format!(
        "Assets ({} of {} selected)",
        app.editor.selection().len(),
        crate::editor::MAX_ASSETS
    );
    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(list, area);
}

fn render_allocation_panel(f: &mut Frame, area: Rect, app: &EditorApp) {
    let block = Block::default().borders(Borders::ALL).title("Allocation");

    let rows = app.editor.visible_rows();
    if rows.is_empty() {
        let placeholder = Paragraph::new("No assets selected yet.\nPick up to 3 from the list.")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(placeholder, area);
        return;
    }

    let bar_space = area.width.saturating_sub(22) as usize;
    let items: Vec<ListItem> = rows
        .iter()
        .map(|(asset, value)| {
            let width = (*value as usize * bar_space) / 100;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", asset.code),
                    Style::default().fg(Color::White),
                ),
                Span::styled("▇".repeat(width.max(1)), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!(" {value:>3}%"),
                    Style::default().fg(Color::Cyan),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(block);
    f.render_widget(list, area);
}

fn render_value_dialog(f: &mut Frame, app: &EditorApp) {
    let popup_area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, popup_area);

    let Some(code) = app.cursor_code() else {
        return;
    };

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .margin(1)
        .split(popup_area);

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Allocation for {code} "))
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    f.render_widget(main_block, popup_area);

    let current = app.editor.allocation(&code).unwrap_or(0);
    let info = Paragraph::new(format!("Current: {current}%"))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(info, popup_layout[0]);

    let cursor = if app.flash_state { "█" } else { "▌" };
    let input_field = Paragraph::new(format!("{}{cursor}", app.input))
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" New % "),
        );
    f.render_widget(input_field, popup_layout[1]);

    // preview the clamped value before it is committed
    let preview = match app.input.trim().parse::<i64>() {
        Ok(v) if v > 100 => "Values above 100 are stored as 100".to_string(),
        Ok(v) => format!("Will be stored as {v}%"),
        Err(_) if app.input.is_empty() => "Empty input is stored as 0%".to_string(),
        Err(_) => "Not a number; stored as 0%".to_string(),
    };
    let preview_paragraph = Paragraph::new(preview)
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(preview_paragraph, popup_layout[2]);
}

fn render_name_dialog(f: &mut Frame, app: &EditorApp) {
    let popup_area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, popup_area);

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Portfolio Name ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    f.render_widget(main_block, popup_area);

    let inner = popup_area.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 2,
    });

    let cursor = if app.flash_state { "█" } else { "▌" };
    let input_field = Paragraph::new(format!("{}{cursor}", app.input))
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(input_field, inner);
}

fn render_panel_loading(f: &mut Frame, area: Rect) {
    let loading_text = Paragraph::new("Loading...")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);
    f.render_widget(loading_text, area);
}

fn render_panel_error(f: &mut Frame, area: Rect, message: &str) {
    let error_text = Paragraph::new(format!("Failed to load: {message}"))
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(error_text, area);
}

fn render_error_popup(f: &mut Frame, error: &str) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_round_trips_through_from_str() {
        for component in Component::all() {
            assert_eq!(
                Component::from_str(component.as_str()).unwrap(),
                component
            );
            assert!(!component.description().is_empty());
        }
        assert!(Component::from_str("bogus").is_err());
    }

    #[test]
    fn disabled_components_ignore_unknown_names() {
        let disabled = DisabledComponents::new(vec![
            "heatmap".to_string(),
            "not_a_component".to_string(),
        ]);
        assert!(disabled.is_disabled(Component::Heatmap));
        assert!(!disabled.is_disabled(Component::NetWorth));
    }

    #[test]
    fn disable_component_marks_it_disabled() {
        let mut disabled = DisabledComponents::default();
        assert!(!disabled.is_disabled(Component::Help));
        disabled.disable_component(Component::Help);
        assert!(disabled.is_disabled(Component::Help));
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(14689.75, "USD"), "$14,689.75");
        assert_eq!(format_currency(999.5, "USD"), "$999.50");
        assert_eq!(format_currency(1234.5, "EUR"), "1,234.50 EUR");
        assert_eq!(format_currency(10.0, "SEK"), "10.00 SEK");
    }

    #[test]
    fn signed_percent_formatting() {
        assert_eq!(format_signed_percent(0.4689), "+46.89%");
        assert_eq!(format_signed_percent(-0.03), "-3.00%");
    }

    #[test]
    fn editor_app_submit_blocks_on_validation_failure() {
        use crate::editor::{Asset, AllocationEditor};

        let catalog = vec![Asset {
            code: "AAPL".to_string(),
            name: "Apple".to_string(),
            company: "Apple Inc.".to_string(),
            logo_url: String::new(),
        }];
        let mut app = EditorApp::new(AllocationEditor::new(catalog));

        app.submit();
        assert_eq!(
            app.error_message.as_deref(),
            Some("Please select at least one asset")
        );
        assert!(app.outcome.is_none());
        assert!(!app.should_quit);

        app.toggle_selected();
        app.enter_name_mode();
        app.input = "My Portfolio".to_string();
        app.commit_input();
        app.error_message = None;
        app.submit();
        assert!(app.outcome.is_some());
        assert!(app.should_quit);
        let fields = app.outcome.unwrap();
        assert!(fields.contains(&("allocation[AAPL]".to_string(), "100".to_string())));
    }
}
