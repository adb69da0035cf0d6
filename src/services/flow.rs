//! flow.rs
//!
//! Контроллер экранного потока покупки билетов.
//!
//! Ключевые компоненты:
//! 1.  **Screen**: конечный набор экранов и отображение серверного шага (`paso`)
//!     на экран при восстановлении сессии.
//! 2.  **FlowController**: явное изменяемое состояние (выбранное событие, карта
//!     мест, выбор, результат продажи, сообщение, флаг занятости) и по одному
//!     методу на каждое действие пользователя.
//!
//! Ошибки удалённых вызовов не выходят наружу: они превращаются в текст
//! `message`, а экран остаётся прежним. Исключение одно: подтверждение продажи
//! всегда ведёт на экран результата. Локальные проверки срабатывают до сети.

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    api_client::ApiClient,
    error::{ClientError, SelectionError, UNEXPECTED_ERROR},
    models::{
        Credentials, EventDetail, EventSummary, Purchase, RegisterRequest, SaleResult, SeatKey,
        SeatSelectionRequest, Session, Step,
    },
    services::{
        seat_map::{SeatCell, SeatMap},
        selection::{SeatSelectionSet, Toggle},
    },
};

/// Сообщение после успешной регистрации.
pub const REGISTERED_MESSAGE: &str = "Registro exitoso. Inicia sesión para continuar.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    EventList,
    EventDetail,
    SeatMap,
    PassengerInfo,
    Confirmation,
    Result,
    Purchases,
}

impl Screen {
    /// Экран, на который возвращает серверный шаг.
    pub fn for_step(step: Step) -> Self {
        match step {
            Step::EventList => Screen::EventList,
            Step::EventDetail => Screen::EventDetail,
            Step::SeatSelection => Screen::SeatMap,
            Step::PassengerData => Screen::PassengerInfo,
            Step::Sale => Screen::Confirmation,
        }
    }
}

pub struct FlowController {
    api: ApiClient,
    credentials: Option<Credentials>,
    screen: Screen,
    events: Vec<EventSummary>,
    selected_event: Option<EventSummary>,
    seat_map: SeatMap,
    selection: SeatSelectionSet,
    sale_result: Option<SaleResult>,
    purchases: Vec<Purchase>,
    message: Option<String>,
    prefill_username: Option<String>,
    busy: bool,
}

impl FlowController {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            credentials: None,
            screen: Screen::Login,
            events: Vec::new(),
            selected_event: None,
            seat_map: SeatMap::default(),
            selection: SeatSelectionSet::new(),
            sale_result: None,
            purchases: Vec::new(),
            message: None,
            prefill_username: None,
            busy: false,
        }
    }

    // --- Чтение состояния ---

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Пока идёт вызов, UI должен блокировать повторный запуск того же действия.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    pub fn prefill_username(&self) -> Option<&str> {
        self.prefill_username.as_deref()
    }

    pub fn events(&self) -> &[EventSummary] {
        &self.events
    }

    pub fn selected_event(&self) -> Option<&EventSummary> {
        self.selected_event.as_ref()
    }

    pub fn seat_map(&self) -> &SeatMap {
        &self.seat_map
    }

    pub fn selection(&self) -> &SeatSelectionSet {
        &self.selection
    }

    pub fn seat_cells(&self) -> Vec<SeatCell> {
        self.seat_map.cells(self.selection.as_slice())
    }

    pub fn sale_result(&self) -> Option<&SaleResult> {
        self.sale_result.as_ref()
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    /// Цена билета × количество выбранных мест.
    pub fn order_total(&self) -> f64 {
        let price = self
            .selected_event
            .as_ref()
            .and_then(|event| event.ticket_price)
            .unwrap_or(0.0);
        price * self.selection.len() as f64
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    // --- Служебное ---

    fn begin(&mut self) {
        self.busy = true;
        self.message = None;
    }

    /// Завершает действие: флаг занятости снимается при любом исходе.
    fn finish(&mut self, outcome: Result<(), ClientError>) {
        self.busy = false;
        if let Err(e) = outcome {
            self.report(e);
        }
    }

    fn report(&mut self, error: ClientError) {
        if error.is_local() {
            debug!("Local check failed on {:?}: {}", self.screen, error);
        } else {
            warn!("Action failed on {:?}: {}", self.screen, error);
        }
        self.message = Some(error.user_message());
    }

    fn require_credentials(&self) -> Result<Credentials, ClientError> {
        self.credentials.clone().ok_or(ClientError::NotAuthenticated)
    }

    fn require_event_id(&self) -> Result<i64, ClientError> {
        self.selected_event
            .as_ref()
            .map(|event| event.id)
            .ok_or(ClientError::NoEventSelected)
    }

    fn on_screen(&self, expected: Screen, action: &str) -> bool {
        if self.screen == expected {
            return true;
        }
        debug!("Ignoring {} on {:?}", action, self.screen);
        false
    }

    /// Сбрасывает всё, что относится к текущей покупке.
    fn clear_purchase_state(&mut self) {
        self.selected_event = None;
        self.seat_map = SeatMap::default();
        self.selection.clear();
        self.sale_result = None;
    }

    fn apply_detail(&mut self, detail: EventDetail) {
        self.seat_map = SeatMap::from_detail(&detail);
        debug!(
            "Seat map for event {}: {}x{}, {} statuses",
            detail.event.id,
            self.seat_map.rows(),
            self.seat_map.columns(),
            self.seat_map.statuses().len()
        );
        self.selected_event = Some(detail.event);
    }

    async fn load_events(&mut self, credentials: &Credentials) -> Result<(), ClientError> {
        self.events = self.api.list_events(credentials).await?;
        info!("Loaded {} events", self.events.len());
        Ok(())
    }

    /// Шаг на сервере обновляется по возможности; сбой только логируется.
    async fn record_step(&self, credentials: &Credentials, step: Step, event_id: Option<i64>) {
        if let Err(e) = self.api.update_step(credentials, step, event_id).await {
            warn!("Could not record step {}: {}", step, e);
        }
    }

    // --- Вход, регистрация, выход ---

    pub async fn login(&mut self, username: &str, password: &str) {
        if !self.on_screen(Screen::Login, "login") {
            return;
        }
        self.begin();
        let outcome = self.try_login(username, password).await;
        self.finish(outcome);
    }

    async fn try_login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let response = self.api.login(username, password).await?;
        if !response.is_success() {
            return Err(ClientError::Rejected(
                response.message.unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
            ));
        }

        let credentials = Credentials::new(username, password);
        self.credentials = Some(credentials.clone());
        self.prefill_username = None;
        self.screen = Screen::EventList;
        info!("User {} logged in", username);

        match self.api.get_session(&credentials).await {
            Ok(session) => self.resume(&credentials, session).await,
            Err(e) => {
                if let Err(list_error) = self.load_events(&credentials).await {
                    warn!("Could not load events after session failure: {}", list_error);
                }
                Err(e)
            }
        }
    }

    /// Возвращает пользователя на шаг из серверной сессии.
    ///
    /// Если в сессии есть событие, экран меняется только после успешной загрузки
    /// его деталей; при ошибке пользователь остаётся на списке событий.
    async fn resume(&mut self, credentials: &Credentials, session: Session) -> Result<(), ClientError> {
        let step = session.step();
        info!("Resuming session at step {} (event {:?})", step, session.evento_id);

        let Some(event_id) = session.evento_id else {
            if step.needs_event() {
                warn!("Step {} has no event in session, falling back to event list", step);
            }
            self.screen = Screen::EventList;
            return self.load_events(credentials).await;
        };

        let detail = match self.api.get_event_detail(credentials, event_id).await {
            Ok(detail) => detail,
            Err(e) => {
                if let Err(list_error) = self.load_events(credentials).await {
                    warn!("Could not load events after resume failure: {}", list_error);
                }
                return Err(e);
            }
        };

        self.apply_detail(detail);
        self.selection = SeatSelectionSet::restore(
            session
                .selections()
                .into_iter()
                .filter(|selection| self.seat_map.contains(selection.seat)),
        );
        self.screen = Screen::for_step(step);

        if self.screen == Screen::EventList {
            self.load_events(credentials).await?;
        }
        Ok(())
    }

    pub async fn register(&mut self, request: RegisterRequest) {
        if !self.on_screen(Screen::Login, "register") {
            return;
        }
        if let Err(e) = request.validate() {
            self.report(e.into());
            return;
        }
        self.begin();
        let outcome = self.try_register(&request).await;
        self.finish(outcome);
    }

    async fn try_register(&mut self, request: &RegisterRequest) -> Result<(), ClientError> {
        let response = self.api.register(request).await?;
        if !response.is_success() {
            return Err(ClientError::Rejected(
                response.message.unwrap_or_else(|| UNEXPECTED_ERROR.to_string()),
            ));
        }
        info!("Registered user {}", request.username);
        self.prefill_username = Some(response.username.unwrap_or_else(|| request.username.clone()));
        self.message = Some(REGISTERED_MESSAGE.to_string());
        Ok(())
    }

    /// Жёсткий сброс на экран входа из любого состояния с сессией.
    pub async fn logout(&mut self) {
        let Some(credentials) = self.credentials.take() else {
            return;
        };
        self.begin();
        if let Err(e) = self.api.logout(&credentials).await {
            warn!("Logout was not acknowledged: {}", e);
        }
        self.clear_purchase_state();
        self.events.clear();
        self.purchases.clear();
        self.screen = Screen::Login;
        self.busy = false;
        info!("User {} logged out", credentials.username);
    }

    // --- Список и детали событий ---

    pub async fn refresh_events(&mut self) {
        if !self.on_screen(Screen::EventList, "refresh_events") {
            return;
        }
        self.begin();
        let outcome = match self.require_credentials() {
            Ok(credentials) => self.load_events(&credentials).await,
            Err(e) => Err(e),
        };
        self.finish(outcome);
    }

    pub async fn select_event(&mut self, event_id: i64) {
        if !self.on_screen(Screen::EventList, "select_event") {
            return;
        }
        self.begin();
        let outcome = self.try_select_event(event_id).await;
        self.finish(outcome);
    }

    async fn try_select_event(&mut self, event_id: i64) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        let detail = self.api.get_event_detail(&credentials, event_id).await?;
        // шаг фиксируется только для реально открытого события
        self.record_step(&credentials, Step::EventDetail, Some(event_id)).await;

        // выбор мест относится к одному событию
        if self.selected_event.as_ref().map(|event| event.id) != Some(event_id) {
            self.selection.clear();
        }
        self.apply_detail(detail);
        self.screen = Screen::EventDetail;
        Ok(())
    }

    pub fn open_seat_map(&mut self) {
        if !self.on_screen(Screen::EventDetail, "open_seat_map") {
            return;
        }
        if self.selected_event.is_none() {
            self.report(ClientError::NoEventSelected);
            return;
        }
        self.message = None;
        self.screen = Screen::SeatMap;
    }

    pub async fn refresh_seats(&mut self) {
        if self.selected_event.is_none() {
            return;
        }
        self.begin();
        let outcome = self.reload_seat_map().await;
        self.finish(outcome);
    }

    async fn reload_seat_map(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        let event_id = self.require_event_id()?;
        let detail = self.api.get_event_detail(&credentials, event_id).await?;
        self.apply_detail(detail);
        Ok(())
    }

    // --- Выбор мест ---

    /// Нажатие на место. Отказ (лимит, занятое место) попадает в `message` как подсказка.
    pub fn toggle_seat(&mut self, seat: SeatKey) {
        match self.try_toggle(seat) {
            Ok(toggle) => {
                debug!("Seat {} {:?}", seat, toggle);
                self.message = None;
            }
            Err(e) => self.report(e),
        }
    }

    fn try_toggle(&mut self, seat: SeatKey) -> Result<Toggle, ClientError> {
        if self.selected_event.is_none() {
            return Err(ClientError::NoEventSelected);
        }
        if !self.seat_map.contains(seat) {
            return Err(SelectionError::OutOfGrid.into());
        }
        if !self.selection.contains(seat) && !self.seat_map.server_status(seat).is_selectable() {
            return Err(SelectionError::SeatUnavailable.into());
        }
        Ok(self.selection.toggle(seat)?)
    }

    pub fn update_passenger_name(&mut self, index: usize, name: &str) {
        if let Err(e) = self.selection.update_passenger_name(index, name) {
            self.report(e.into());
        }
    }

    /// Отправляет выбор и блокирует места. Дальше только если блокировка прошла.
    pub async fn submit_seat_selection(&mut self) {
        if !self.on_screen(Screen::SeatMap, "submit_seat_selection") {
            return;
        }
        if let Err(e) = self.selection.validate_seat_choice() {
            self.report(e.into());
            return;
        }
        self.begin();
        let outcome = self.try_submit_seat_selection().await;
        self.finish(outcome);
    }

    async fn try_submit_seat_selection(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        let event_id = self.require_event_id()?;
        let request = SeatSelectionRequest::from_selections(event_id, self.selection.as_slice());
        self.api.select_seats(&credentials, &request).await?;

        let block = self.api.block_seats(&credentials).await?;
        if !block.is_success() {
            let reason = block.reason().unwrap_or_else(|| UNEXPECTED_ERROR.to_string());
            warn!("Seats for event {} were not blocked: {}", event_id, reason);
            if let Err(e) = self.reload_seat_map().await {
                warn!("Could not refresh seat map: {}", e);
            }
            return Err(ClientError::Rejected(reason));
        }

        info!("Blocked {} seats for event {}", self.selection.len(), event_id);
        self.screen = Screen::PassengerInfo;
        Ok(())
    }

    /// Сохраняет имена пассажиров и переходит к подтверждению.
    pub async fn continue_to_confirmation(&mut self) {
        if !self.on_screen(Screen::PassengerInfo, "continue_to_confirmation") {
            return;
        }
        if let Err(e) = self.selection.validate_for_submission() {
            self.report(e.into());
            return;
        }
        self.begin();
        let outcome = self.try_continue_to_confirmation().await;
        self.finish(outcome);
    }

    async fn try_continue_to_confirmation(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        let event_id = self.require_event_id()?;
        let request = SeatSelectionRequest::from_selections(event_id, self.selection.as_slice());
        self.api.select_seats(&credentials, &request).await?;
        self.record_step(&credentials, Step::Sale, Some(event_id)).await;
        self.screen = Screen::Confirmation;
        Ok(())
    }

    /// Попытка продажи. Экран результата показывается при любом исходе;
    /// выбор очищается только после успешной продажи.
    pub async fn confirm_sale(&mut self) {
        if !self.on_screen(Screen::Confirmation, "confirm_sale") {
            return;
        }
        let credentials = match self.require_credentials() {
            Ok(credentials) => credentials,
            Err(e) => return self.report(e),
        };
        self.begin();

        let sale = match self.api.complete_sale(&credentials).await {
            Ok(sale) => sale,
            Err(e) => {
                warn!("Sale request failed: {}", e);
                SaleResult::rejected(e.user_message())
            }
        };

        if sale.is_success() {
            info!("Sale {:?} completed with {} seats", sale.venta_id, sale.asientos.len());
            self.message = sale.display_message();
            self.clear_purchase_state();
        } else {
            let reason = sale.display_message().unwrap_or_else(|| UNEXPECTED_ERROR.to_string());
            warn!("Sale rejected: {}", reason);
            self.message = Some(reason);
        }

        self.sale_result = Some(sale);
        self.screen = Screen::Result;
        self.busy = false;
    }

    /// С экрана результата обратно к списку; состояние покупки очищается.
    pub async fn start_over(&mut self) {
        if !self.on_screen(Screen::Result, "start_over") {
            return;
        }
        self.begin();
        let outcome = self.try_start_over().await;
        self.finish(outcome);
    }

    async fn try_start_over(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        self.clear_purchase_state();
        if let Err(e) = self.api.delete_session(&credentials).await {
            warn!("Could not delete server session: {}", e);
        }
        // экран меняется и при неудачной загрузке списка: покупка уже сброшена
        self.screen = Screen::EventList;
        self.load_events(&credentials).await
    }

    // --- История покупок ---

    /// Боковой экран: выбор и событие основного потока не трогаются.
    pub async fn show_purchases(&mut self) {
        if !self.on_screen(Screen::EventList, "show_purchases") {
            return;
        }
        self.begin();
        let outcome = self.try_show_purchases().await;
        self.finish(outcome);
    }

    async fn try_show_purchases(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        self.purchases = self.api.list_purchases(&credentials).await?;
        self.screen = Screen::Purchases;
        Ok(())
    }

    pub async fn refresh_purchases(&mut self) {
        if !self.on_screen(Screen::Purchases, "refresh_purchases") {
            return;
        }
        self.begin();
        let outcome = self.try_show_purchases().await;
        self.finish(outcome);
    }

    // --- Навигация назад ---

    pub async fn back(&mut self) {
        match self.screen {
            Screen::EventDetail => {
                self.begin();
                let outcome = self.try_back_to_list().await;
                self.finish(outcome);
            }
            Screen::SeatMap => self.screen = Screen::EventDetail,
            Screen::PassengerInfo => self.screen = Screen::SeatMap,
            Screen::Confirmation => self.screen = Screen::PassengerInfo,
            Screen::Purchases => self.screen = Screen::EventList,
            Screen::Login | Screen::EventList | Screen::Result => {
                debug!("No back navigation from {:?}", self.screen)
            }
        }
    }

    async fn try_back_to_list(&mut self) -> Result<(), ClientError> {
        let credentials = self.require_credentials()?;
        self.record_step(&credentials, Step::EventList, None).await;
        // список показывается даже пустым, ошибка загрузки уходит в message
        self.screen = Screen::EventList;
        self.load_events(&credentials).await
    }
}
