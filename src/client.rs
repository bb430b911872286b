use crate::ui;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use roulette_table::{
    Board,
    BoardSession,
    ChipValue,
    ClickOutcome,
    SlotColor,
    SlotId,
    SlotKind,
    TableBinding,
    config::AppConfig,
    wallets::{
        self,
        AccountAddress,
    },
    withdrawal::{
        ApiClient,
        BalanceSource,
        CoingeckoClient,
        PriceFeed,
        Token,
        TokenAmount,
        TransactionSummary,
        WithdrawOutcome,
        WithdrawalBackend,
        WithdrawalFlow,
        receipts::{
            NetworkEnv,
            WithdrawalLog,
            WithdrawalRecord,
        },
    },
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};
use tokio::{
    sync::{
        mpsc,
        watch,
    },
    time,
};
use tracing::{
    error,
    info,
    warn,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const MAX_ERRORS: usize = 50;
const LOG_FILE_PREFIX: &str = "roulette-table.log";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellSnapshot {
    pub id: SlotId,
    pub label: String,
    pub color: SlotColor,
    pub is_first: bool,
    pub chips: Option<Vec<ChipValue>>,
}

impl CellSnapshot {
    /// Board slots are numbered by their id.
    pub fn number(&self) -> u8 {
        self.id.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct WithdrawalSnapshot {
    pub token: Token,
    pub amount: String,
    pub loading: bool,
    pub usd_value: f64,
    pub platform_balance: Option<String>,
    pub wallet_balance: Option<String>,
    pub insufficient: bool,
    pub last_summary: Option<TransactionSummary>,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub network: NetworkEnv,
    pub board: Vec<CellSnapshot>,
    pub outside: Vec<CellSnapshot>,
    pub cursor: SlotId,
    pub denominations: Vec<ChipValue>,
    pub selected_chip: Option<ChipValue>,
    pub erase_mode: bool,
    pub revision: u64,
    pub staked: u64,
    pub wallet: Option<AccountAddress>,
    pub withdrawal: WithdrawalSnapshot,
    pub status: String,
    pub errors: Vec<String>,
}

pub struct AppController {
    network: NetworkEnv,
    table: TableBinding,
    denominations: Vec<ChipValue>,
    cursor: SlotId,
    withdrawal: WithdrawalFlow,
    api: ApiClient,
    price_api_url: String,
    price_poll_interval: Duration,
    wallet: Option<AccountAddress>,
    wallet_dir: PathBuf,
    platform_account: Option<AccountAddress>,
    receipts: WithdrawalLog,
    last_summary: Option<TransactionSummary>,
    status: String,
    errors: Vec<String>,
}

impl AppController {
    pub fn new(config: AppConfig) -> Result<Self> {
        let api = ApiClient::new(config.api_url.clone())
            .wrap_err("failed to build platform API client")?;
        let receipts = WithdrawalLog::open(&config.withdrawals_dir, config.network)?;
        let mut errors = Vec::new();
        let wallet = match &config.wallet {
            Some(w) => match wallets::connect_wallet(&w.dir, &w.name) {
                Ok(address) => {
                    info!(wallet = %w.name, address = %address, "wallet connected");
                    Some(address)
                }
                Err(err) => {
                    warn!(wallet = %w.name, error = %err, "wallet connection failed");
                    errors.push(format!("Wallet {} unavailable: {err}", w.name));
                    None
                }
            },
            None => None,
        };
        let table = TableBinding::new(BoardSession::new(Board::roulette()));
        let cursor = table.board().slot_id_at(0)?;
        Ok(Self {
            network: config.network,
            table,
            denominations: config.denominations,
            cursor,
            withdrawal: WithdrawalFlow::new(),
            api,
            price_api_url: config.price_api_url,
            price_poll_interval: config.price_poll_interval,
            wallet,
            wallet_dir: config.wallet_dir,
            platform_account: None,
            receipts,
            last_summary: None,
            status: String::from("Select a chip and place your bets"),
            errors,
        })
    }

    pub fn subscribe_board(&self) -> watch::Receiver<Board> {
        self.table.subscribe()
    }

    pub fn cursor(&self) -> SlotId {
        self.cursor
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_ERRORS {
            let drain = self.errors.len() - MAX_ERRORS;
            self.errors.drain(0..drain);
        }
    }

    /// Moves the cursor through the slots in board order, wrapping at both ends.
    pub fn move_cursor(&mut self, delta: isize) {
        let board = self.table.board();
        let Some(pos) = board.position(self.cursor) else {
            return;
        };
        let len = board.len() as isize;
        let next = (pos as isize + delta).rem_euclid(len) as usize;
        if let Ok(id) = board.slot_id_at(next) {
            self.cursor = id;
        }
    }

    /// Moves the cursor one grid row. Leaving the bottom row of the numbers
    /// lands on the outside bet below the same column.
    pub fn move_row(&mut self, up: bool) {
        let board = self.table.board();
        let outside: Vec<SlotId> = board
            .slots()
            .iter()
            .filter(|s| s.kind == SlotKind::Outside)
            .map(|s| s.id)
            .collect();
        let next = if let Some(column) = outside.iter().position(|id| *id == self.cursor) {
            up.then(|| SlotId((column * 3 + 1) as u8))
        } else {
            match self.cursor.0 {
                n @ 1..=36 => {
                    let offset = (n - 1) % 3;
                    let column = ((n - 1) / 3) as usize;
                    match (up, offset) {
                        (true, 0 | 1) => Some(SlotId(n + 1)),
                        (false, 1 | 2) => Some(SlotId(n - 1)),
                        (false, 0) => outside.get(column).copied(),
                        _ => None,
                    }
                }
                _ => None,
            }
        };
        if let Some(id) = next.filter(|id| board.get(*id).is_some()) {
            self.cursor = id;
        }
    }

    pub fn select_denomination(&mut self, index: usize) {
        match self.denominations.get(index).copied() {
            Some(chip) => {
                self.table.select_chip(Some(chip));
                self.set_status(format!("Chip {chip} selected"));
            }
            None => self.set_status(format!("No chip on key {}", index + 1)),
        }
    }

    pub fn clear_denomination(&mut self) {
        self.table.select_chip(None);
        self.set_status("No chip selected");
    }

    pub fn toggle_erase(&mut self) {
        let erase = self.table.toggle_erase_mode();
        self.set_status(if erase {
            "Erase mode: clicks clear a slot"
        } else {
            "Place mode"
        });
    }

    pub fn click(&mut self) {
        let target = self.cursor;
        match self.table.click(target) {
            Ok(ClickOutcome::Placed { slot, chip }) => {
                let label = self.slot_label(slot);
                self.set_status(format!("Placed {chip} on {label}"));
            }
            Ok(ClickOutcome::Erased { slot }) => {
                let label = self.slot_label(slot);
                self.set_status(format!("Cleared {label}"));
            }
            Ok(ClickOutcome::Unchanged) => {
                self.set_status("Select a chip to play");
            }
            Err(err) => self.push_errors(vec![format!("Click failed: {err}")]),
        }
    }

    pub fn new_session(&mut self) {
        self.table.reset(Board::roulette());
        self.set_status("New session: board cleared");
    }

    fn slot_label(&self, id: SlotId) -> String {
        self.table
            .board()
            .get(id)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn withdrawal_token(&self) -> Token {
        self.withdrawal.token()
    }

    pub fn push_amount_char(&mut self, c: char) {
        self.withdrawal.push_amount_char(c);
    }

    pub fn pop_amount_char(&mut self) {
        self.withdrawal.pop_amount_char();
    }

    pub fn toggle_token(&mut self) -> Token {
        let token = self.withdrawal.token().toggled();
        self.withdrawal.select_token(token);
        token
    }

    pub fn apply_price(&mut self, token: Token, price: f64) {
        self.withdrawal.set_price(token, price);
    }

    /// Loads the supported token list and the platform account when missing.
    pub async fn load_platform(&mut self) {
        if self.withdrawal.supported_tokens().is_empty() {
            match self.api.supported_tokens().await {
                Ok(tokens) => self.withdrawal.set_supported_tokens(tokens),
                Err(err) => {
                    self.push_errors(vec![format!("Loading supported tokens failed: {err}")])
                }
            }
        }
        if self.platform_account.is_none() {
            match self.api.platform_account().await {
                Ok(account) => self.platform_account = Some(account),
                Err(err) => {
                    self.push_errors(vec![format!("Loading platform account failed: {err}")])
                }
            }
        }
    }

    pub async fn refresh_balances(&mut self) {
        let token = self.withdrawal.token();
        let Some(supported) = token.resolve(self.withdrawal.supported_tokens()).cloned()
        else {
            return;
        };
        let platform = async {
            match &self.platform_account {
                Some(account) => Some(self.api.balance(account, &supported).await),
                None => None,
            }
        };
        let wallet = async {
            match &self.wallet {
                Some(address) => Some(self.api.balance(address, &supported).await),
                None => None,
            }
        };
        let (platform, wallet) = futures::join!(platform, wallet);
        let mut failures = Vec::new();
        let mut settle = |result: Option<Result<TokenAmount, _>>, source: &str| match result {
            Some(Ok(amount)) => Some(amount),
            Some(Err(err)) => {
                failures.push(format!("Loading {source} balance failed: {err}"));
                None
            }
            None => None,
        };
        let platform = settle(platform, "platform");
        let wallet = settle(wallet, "wallet");
        self.withdrawal.set_balances(token, platform, wallet);
        self.push_errors(failures);
    }

    pub async fn submit_withdrawal(&mut self) {
        match self
            .withdrawal
            .submit(&self.api, self.wallet.as_ref())
            .await
        {
            WithdrawOutcome::ConnectWallet => {
                let hint = self.connect_wallet_hint();
                self.set_status(hint);
            }
            WithdrawOutcome::Warning(message) => self.set_status(message),
            WithdrawOutcome::Submitted(summary) => {
                let record =
                    WithdrawalRecord::from_summary(&summary, Some(self.api.base_url()));
                match self.receipts.record(record) {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(tx = %summary.transaction_hash, "withdrawal already recorded")
                    }
                    Err(err) => {
                        self.push_errors(vec![format!("Recording withdrawal failed: {err:#}")])
                    }
                }
                self.set_status(format!(
                    "Withdrew {} {} | tx {}",
                    summary.amount, summary.token, summary.transaction_hash
                ));
                self.last_summary = Some(summary);
                self.refresh_balances().await;
            }
            WithdrawOutcome::Failed(message) => self.push_errors(vec![message]),
        }
    }

    /// Status line asking for a wallet, listing the descriptors found in the
    /// configured wallet directory.
    fn connect_wallet_hint(&self) -> String {
        let available = match wallets::list_wallets(&self.wallet_dir) {
            Ok(found) if !found.is_empty() => format!(
                " (available: {})",
                found.iter().map(|w| w.name.as_str()).collect::<Vec<_>>().join(", ")
            ),
            Ok(_) => String::new(),
            Err(err) => {
                warn!(dir = %self.wallet_dir.display(), error = %err, "listing wallets failed");
                String::new()
            }
        };
        format!("Connect a wallet: restart with --wallet <name>{available}")
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let cells = |views: Vec<roulette_table::SlotView<'_>>| {
            views
                .into_iter()
                .map(|v| CellSnapshot {
                    id: v.id,
                    label: v.label.to_string(),
                    color: v.color,
                    is_first: v.is_first,
                    chips: v.chips.map(|c| c.to_vec()),
                })
                .collect::<Vec<_>>()
        };
        let board = self.table.board();
        let selection = self.table.selection();
        let form = self.withdrawal.form();
        AppSnapshot {
            network: self.network,
            board: cells(self.table.board_view()),
            outside: cells(self.table.outside_view()),
            cursor: self.cursor,
            denominations: self.denominations.clone(),
            selected_chip: selection.pending_chip,
            erase_mode: selection.erase_mode,
            revision: self.table.session().revision(),
            staked: board
                .slots()
                .iter()
                .fold(0u64, |acc, s| acc.saturating_add(s.coins.total())),
            wallet: self.wallet.clone(),
            withdrawal: WithdrawalSnapshot {
                token: form.token,
                amount: form.amount.clone(),
                loading: form.loading,
                usd_value: self.withdrawal.usd_value(),
                platform_balance: form.platform_balance.map(|b| b.format_fixed(2)),
                wallet_balance: form.wallet_balance.map(|b| b.format_fixed(2)),
                insufficient: self.withdrawal.insufficient_balance(),
                last_summary: self.last_summary.clone(),
            },
            status: self.status.clone(),
            errors: self.errors.clone(),
        }
    }
}

pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| eyre!("failed to install tracing subscriber: {e}"))?;
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let mut controller = AppController::new(config)?;
    controller.load_platform().await;
    let mut ui_state = ui::UiState::default();
    let mut input_events = ui::input_event_stream();

    tracing::info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(controller, &mut ui_state, &mut input_events).await;
    ui::terminal_exit()?;
    res
}

#[derive(Debug)]
enum PriceWorkerCommand {
    Track(Token),
    Shutdown,
}

#[derive(Debug)]
enum PriceWorkerEvent {
    Price(Token, f64),
    Failed(Token, String),
}

/// Returns whether the worker accepted the command.
fn send_price_command(
    tx: &mpsc::UnboundedSender<PriceWorkerCommand>,
    cmd: PriceWorkerCommand,
) -> bool {
    match tx.send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("price worker channel closed, command dropped");
            false
        }
    }
}

async fn price_worker<P: PriceFeed>(
    poll_interval: Duration,
    prices: P,
    mut token: Token,
    mut cmd_rx: mpsc::UnboundedReceiver<PriceWorkerCommand>,
    event_tx: mpsc::UnboundedSender<PriceWorkerEvent>,
) -> Result<()> {
    async fn fetch<P: PriceFeed>(
        prices: &P,
        token: Token,
        event_tx: &mpsc::UnboundedSender<PriceWorkerEvent>,
    ) -> Result<()> {
        let event = match prices.usd_price(token).await {
            Ok(price) => PriceWorkerEvent::Price(token, price),
            Err(err) => {
                warn!(%token, error = %err, "price fetch failed");
                PriceWorkerEvent::Failed(token, err.to_string())
            }
        };
        event_tx
            .send(event)
            .map_err(|_| eyre!("price receiver dropped"))
    }

    let mut ticker = time::interval(poll_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                fetch(&prices, token, &event_tx).await?;
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(PriceWorkerCommand::Track(next)) => {
                        token = next;
                        fetch(&prices, token, &event_tx).await?;
                    }
                    Some(PriceWorkerCommand::Shutdown) | None => break,
                }
            }
        }
    }
    Ok(())
}

async fn run_loop(
    mut controller: AppController,
    ui_state: &mut ui::UiState,
    input_events: &mut ui::InputEventReceiver,
) -> Result<()> {
    tracing::info!("Running app loop");
    let prices = CoingeckoClient::new(controller.price_api_url.clone())
        .wrap_err("failed to build price client")?;
    let (price_cmd_tx, price_cmd_rx) = mpsc::unbounded_channel();
    let (price_event_tx, mut price_event_rx) = mpsc::unbounded_channel();
    let price_handle = tokio::spawn(price_worker(
        controller.price_poll_interval,
        prices,
        controller.withdrawal_token(),
        price_cmd_rx,
        price_event_tx,
    ));
    let mut board_rx = controller.subscribe_board();

    ui::draw(ui_state, &controller.snapshot()).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            changed = board_rx.changed() => {
                if changed.is_err() {
                    warn!("board channel closed");
                    break;
                }
            }
            maybe_event = price_event_rx.recv() => {
                match maybe_event {
                    Some(PriceWorkerEvent::Price(token, price)) => {
                        controller.apply_price(token, price);
                    }
                    Some(PriceWorkerEvent::Failed(token, message)) => {
                        controller.push_errors(vec![format!("{token} price unavailable: {message}")]);
                    }
                    None => {
                        warn!("price worker channel closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            raw_ev = ui::next_raw_event(input_events) => {
                let event = raw_ev?;
                let Some(ev) = ui::interpret_event(ui_state, event) else {
                    continue;
                };
                match ev {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::MoveCursor(delta) => controller.move_cursor(delta),
                    ui::UserEvent::MoveRow { up } => controller.move_row(up),
                    ui::UserEvent::SelectChip(index) => controller.select_denomination(index),
                    ui::UserEvent::ClearChip => controller.clear_denomination(),
                    ui::UserEvent::ToggleErase => controller.toggle_erase(),
                    ui::UserEvent::Click => controller.click(),
                    ui::UserEvent::NewSession => controller.new_session(),
                    ui::UserEvent::OpenWithdraw => {
                        controller.set_status("Loading balances...");
                        ui::draw(ui_state, &controller.snapshot())
                            .wrap_err("draw while loading balances failed")?;
                        controller.load_platform().await;
                        controller.refresh_balances().await;
                        send_price_command(
                            &price_cmd_tx,
                            PriceWorkerCommand::Track(controller.withdrawal_token()),
                        );
                        controller.set_status("Withdraw to your wallet");
                    }
                    ui::UserEvent::CloseWithdraw => controller.set_status("Withdrawal closed"),
                    ui::UserEvent::AmountChar(c) => controller.push_amount_char(c),
                    ui::UserEvent::AmountBackspace => controller.pop_amount_char(),
                    ui::UserEvent::ToggleToken => {
                        let token = controller.toggle_token();
                        send_price_command(&price_cmd_tx, PriceWorkerCommand::Track(token));
                        controller.refresh_balances().await;
                    }
                    ui::UserEvent::SubmitWithdraw => {
                        controller.set_status("Submitting withdrawal...");
                        ui::draw(ui_state, &controller.snapshot())
                            .wrap_err("draw while submitting withdrawal failed")?;
                        controller.submit_withdrawal().await;
                    }
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot()).wrap_err("draw failed")?;
    }

    send_price_command(&price_cmd_tx, PriceWorkerCommand::Shutdown);
    match price_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "price worker stopped with an error"),
        Err(err) => warn!(error = %err, "price worker panicked"),
    }
    Ok(())
}
