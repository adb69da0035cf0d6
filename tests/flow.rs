use serde_json::{json, Value};
use ticket_client::{
    config::ApiConfig,
    models::{RegisterRequest, SeatKey, SeatStatus},
    services::flow::REGISTERED_MESSAGE,
    ApiClient, FlowController, Screen,
};
use wiremock::{
    matchers::{body_partial_json, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn controller(server: &MockServer) -> FlowController {
    let api = ApiClient::from_config(&ApiConfig {
        base_url: server.uri(),
        timeout_seconds: 5,
    })
    .unwrap();
    FlowController::new(api)
}

fn event_detail() -> Value {
    json!({
        "evento": {
            "id": 7,
            "titulo": "Concierto",
            "filaAsientos": 3,
            "columnaAsientos": 4,
            "precioEntrada": 1500.0
        },
        "asientos": [
            {"fila": 1, "columna": 1, "estado": "Vendido"},
            {"fila": 2, "columna": 2, "estado": "Bloqueado"}
        ]
    })
}

fn events() -> Value {
    json!([
        {"id": 7, "titulo": "Concierto", "filaAsientos": 3, "columnaAsientos": 4, "precioEntrada": 1500.0},
        {"id": 8, "titulo": "Teatro"}
    ])
}

async fn mount_json(server: &MockServer, verb: &str, route: &str, status: u16, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_login(server: &MockServer, session: Value) {
    mount_json(server, "POST", "/api/auth/login", 200, json!({"success": true, "username": "ana"})).await;
    mount_json(server, "GET", "/api/sesion", 200, session).await;
}

/// Вход с пустой сессией: пользователь на списке событий.
async fn logged_in(server: &MockServer) -> FlowController {
    mount_login(server, json!({"paso": "LISTADO_EVENTOS"})).await;
    mount_json(server, "GET", "/api/eventos", 200, events()).await;
    mount_json(server, "POST", "/api/sesion/paso", 200, json!({})).await;

    let mut flow = controller(server);
    flow.login("ana", "secreto").await;
    assert_eq!(flow.screen(), Screen::EventList);
    flow
}

/// Открытая карта мест события 7.
async fn on_seat_map(server: &MockServer) -> FlowController {
    mount_json(server, "GET", "/api/eventos/7", 200, event_detail()).await;
    let mut flow = logged_in(server).await;
    flow.select_event(7).await;
    assert_eq!(flow.screen(), Screen::EventDetail);
    flow.open_seat_map();
    assert_eq!(flow.screen(), Screen::SeatMap);
    flow
}

#[tokio::test]
async fn login_resumes_seat_map_with_restored_selection() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        json!({
            "paso": "SELECCION_ASIENTOS",
            "eventoId": 7,
            "asientosSeleccionados": [{"fila": 1, "columna": 2, "persona": "Ana"}]
        }),
    )
    .await;
    mount_json(&server, "GET", "/api/eventos/7", 200, event_detail()).await;
    Mock::given(method("GET"))
        .and(path("/api/eventos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(events()))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;

    assert_eq!(flow.screen(), Screen::SeatMap);
    assert!(!flow.is_busy());
    assert_eq!(flow.message(), None);
    assert_eq!(flow.selected_event().map(|e| e.id), Some(7));
    assert_eq!(flow.selection().len(), 1);
    assert_eq!(flow.selection().as_slice()[0].passenger_name, "Ana");

    let map = flow.seat_map();
    assert_eq!(map.server_status(SeatKey::new(1, 1)), SeatStatus::Sold);
    assert_eq!(map.server_status(SeatKey::new(2, 2)), SeatStatus::Blocked);
    let cells = flow.seat_cells();
    assert_eq!(cells.len(), 12);
    assert_eq!(cells[1].status, SeatStatus::Selected);
}

#[tokio::test]
async fn failed_resume_stays_on_event_list_with_message() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"paso": "VENTA", "eventoId": 7})).await;
    mount_json(&server, "GET", "/api/eventos/7", 404, json!({"message": "Evento no disponible"})).await;
    mount_json(&server, "GET", "/api/eventos", 200, events()).await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;

    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.message(), Some("Evento no disponible"));
    assert_eq!(flow.events().len(), 2);
    assert!(flow.is_authenticated());
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn step_without_event_falls_back_to_event_list() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"paso": "CARGA_DATOS"})).await;
    mount_json(&server, "GET", "/api/eventos", 200, events()).await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;

    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.events().len(), 2);
    assert_eq!(flow.message(), None);
}

#[tokio::test]
async fn resume_skips_session_seats_without_coordinates() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        json!({
            "paso": "SELECCION_ASIENTOS",
            "eventoId": 7,
            "asientosSeleccionados": [
                {"fila": -1, "columna": 1},
                {"fila": null, "columna": 3},
                {"fila": 1, "columna": 2, "persona": "Ana"}
            ]
        }),
    )
    .await;
    mount_json(&server, "GET", "/api/eventos/7", 200, event_detail()).await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;

    assert_eq!(flow.screen(), Screen::SeatMap);
    assert_eq!(flow.message(), None);
    assert_eq!(flow.selection().len(), 1);
    assert!(flow.selection().contains(SeatKey::new(1, 2)));
    assert_eq!(flow.selection().as_slice()[0].passenger_name, "Ana");
}

#[tokio::test]
async fn unreachable_backend_keeps_login_with_transport_message() {
    // порт 9 (discard) на localhost обычно закрыт
    let api = ApiClient::from_config(&ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_seconds: 2,
    })
    .unwrap();
    let mut flow = FlowController::new(api);

    flow.login("ana", "secreto").await;

    assert_eq!(flow.screen(), Screen::Login);
    assert!(!flow.is_busy());
    let message = flow.message().unwrap();
    assert!(!message.trim().is_empty());
    assert_ne!(message, "Error inesperado");
}

#[tokio::test]
async fn rejected_login_stays_on_login() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/auth/login", 401, json!({"message": "Credenciales inválidas"})).await;

    let mut flow = controller(&server);
    flow.login("ana", "mala").await;

    assert_eq!(flow.screen(), Screen::Login);
    assert_eq!(flow.message(), Some("Credenciales inválidas"));
    assert!(!flow.is_authenticated());
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn register_prefills_username_and_stays_on_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_partial_json(json!({"username": "luis", "firstName": "Luis"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "username": "luis"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = controller(&server);
    flow.register(RegisterRequest {
        username: "luis".into(),
        password: "secreto".into(),
        email: "luis@example.com".into(),
        first_name: "Luis".into(),
        last_name: "Gómez".into(),
    })
    .await;

    assert_eq!(flow.screen(), Screen::Login);
    assert_eq!(flow.prefill_username(), Some("luis"));
    assert_eq!(flow.message(), Some(REGISTERED_MESSAGE));
}

#[tokio::test]
async fn invalid_registration_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = controller(&server);
    flow.register(RegisterRequest {
        username: "luis".into(),
        password: "secreto".into(),
        email: "no-es-email".into(),
        first_name: " ".into(),
        last_name: "Gómez".into(),
    })
    .await;

    assert!(flow.message().is_some());
    assert_eq!(flow.prefill_username(), None);
}

#[tokio::test]
async fn toggling_respects_limit_and_availability() {
    let server = MockServer::start().await;
    let mut flow = on_seat_map(&server).await;

    flow.toggle_seat(SeatKey::new(1, 1));
    assert_eq!(flow.message(), Some("El asiento no está disponible"));
    flow.toggle_seat(SeatKey::new(4, 1));
    assert_eq!(flow.message(), Some("El asiento está fuera del mapa"));
    assert!(flow.selection().is_empty());

    for column in 1..=4 {
        flow.toggle_seat(SeatKey::new(3, column));
    }
    assert_eq!(flow.selection().len(), 4);
    assert_eq!(flow.message(), None);

    flow.toggle_seat(SeatKey::new(1, 2));
    assert_eq!(flow.message(), Some("Solo se permiten hasta 4 asientos"));
    assert_eq!(flow.selection().len(), 4);
    assert!(!flow.selection().contains(SeatKey::new(1, 2)));

    assert_eq!(flow.order_total(), 6000.0);
}

#[tokio::test]
async fn empty_selection_is_rejected_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sesion/seleccionar-asientos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let mut flow = on_seat_map(&server).await;

    flow.submit_seat_selection().await;

    assert_eq!(flow.screen(), Screen::SeatMap);
    assert_eq!(flow.message(), Some("Selecciona al menos 1 asiento"));
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn failed_block_stays_on_seat_map_and_refreshes() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/sesion/seleccionar-asientos", 200, json!({})).await;
    mount_json(
        &server,
        "POST",
        "/api/sesion/bloquear-asientos",
        200,
        json!({"success": false, "descripcion": "Asiento bloqueado por otro usuario"}),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/eventos/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_detail()))
        .expect(2)
        .mount(&server)
        .await;

    let mut flow = logged_in(&server).await;
    flow.select_event(7).await;
    flow.open_seat_map();
    flow.toggle_seat(SeatKey::new(1, 2));
    flow.submit_seat_selection().await;

    assert_eq!(flow.screen(), Screen::SeatMap);
    assert_eq!(flow.message(), Some("Asiento bloqueado por otro usuario"));
    assert_eq!(flow.selection().len(), 1);
    assert!(!flow.is_busy());
}

/// Места выбраны, заблокированы, имена заполнены: экран подтверждения.
async fn on_confirmation(server: &MockServer) -> FlowController {
    mount_json(server, "POST", "/api/sesion/seleccionar-asientos", 200, json!({})).await;
    mount_json(server, "POST", "/api/sesion/bloquear-asientos", 200, json!({"success": true})).await;

    let mut flow = on_seat_map(server).await;
    flow.toggle_seat(SeatKey::new(1, 2));
    flow.toggle_seat(SeatKey::new(1, 3));
    flow.submit_seat_selection().await;
    assert_eq!(flow.screen(), Screen::PassengerInfo);

    flow.update_passenger_name(0, "Ana Pérez");
    flow.continue_to_confirmation().await;
    assert_eq!(flow.screen(), Screen::PassengerInfo);
    assert_eq!(flow.message(), Some("Completa el nombre y apellido para cada asiento"));

    flow.update_passenger_name(1, "Luis Gómez");
    flow.continue_to_confirmation().await;
    assert_eq!(flow.screen(), Screen::Confirmation);
    assert_eq!(flow.order_total(), 3000.0);
    flow
}

#[tokio::test]
async fn successful_sale_clears_purchase_state() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "POST",
        "/api/ventas/realizar",
        200,
        json!({
            "success": true,
            "ventaId": 99,
            "descripcion": "Venta realizada",
            "asientos": [
                {"fila": 1, "columna": 2, "persona": "Ana Pérez", "estado": "Vendido"},
                {"fila": 1, "columna": 3, "persona": "Luis Gómez", "estado": "Vendido"}
            ]
        }),
    )
    .await;
    let mut flow = on_confirmation(&server).await;

    flow.confirm_sale().await;

    assert_eq!(flow.screen(), Screen::Result);
    assert_eq!(flow.message(), Some("Venta realizada"));
    assert!(flow.selection().is_empty());
    assert!(flow.selected_event().is_none());
    let sale = flow.sale_result().unwrap();
    assert!(sale.is_success());
    assert_eq!(sale.venta_id, Some(99));
    assert_eq!(sale.asientos[0].status(), SeatStatus::Sold);

    mount_json(&server, "DELETE", "/api/sesion", 200, json!({})).await;
    flow.start_over().await;
    assert_eq!(flow.screen(), Screen::EventList);
    assert!(flow.sale_result().is_none());
}

#[tokio::test]
async fn rejected_sale_shows_result_and_keeps_selection() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "POST",
        "/api/ventas/realizar",
        200,
        json!({"success": false, "descripcion": "Asiento ya vendido"}),
    )
    .await;
    let mut flow = on_confirmation(&server).await;

    flow.confirm_sale().await;

    assert_eq!(flow.screen(), Screen::Result);
    assert_eq!(flow.message(), Some("Asiento ya vendido"));
    assert_eq!(flow.selection().len(), 2);
    assert!(!flow.sale_result().unwrap().is_success());
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn sale_server_error_still_reaches_result() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/ventas/realizar", 502, json!({})).await;
    let mut flow = on_confirmation(&server).await;

    flow.confirm_sale().await;

    assert_eq!(flow.screen(), Screen::Result);
    assert_eq!(flow.message(), Some("Error inesperado"));
    assert_eq!(flow.selection().len(), 2);
}

#[tokio::test]
async fn undecodable_sale_response_reaches_result_with_transport_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ventas/realizar"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;
    let mut flow = on_confirmation(&server).await;

    flow.confirm_sale().await;

    assert_eq!(flow.screen(), Screen::Result);
    assert!(!flow.is_busy());
    let message = flow.message().unwrap();
    assert!(!message.trim().is_empty());
    assert_ne!(message, "Error inesperado");
    let sale = flow.sale_result().unwrap();
    assert!(!sale.is_success());
    assert_eq!(sale.display_message().as_deref(), Some(message));
    assert_eq!(flow.selection().len(), 2);
}

#[tokio::test]
async fn undecodable_selection_response_stays_on_seat_map() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sesion/seleccionar-asientos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sesion/bloquear-asientos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;
    let mut flow = on_seat_map(&server).await;
    flow.toggle_seat(SeatKey::new(1, 2));

    flow.submit_seat_selection().await;

    assert_eq!(flow.screen(), Screen::SeatMap);
    assert!(!flow.is_busy());
    let message = flow.message().unwrap();
    assert!(!message.trim().is_empty());
    assert_ne!(message, "Error inesperado");
    assert_eq!(flow.selection().len(), 1);
}

#[tokio::test]
async fn failed_event_detail_leaves_server_step_untouched() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"paso": "LISTADO_EVENTOS"})).await;
    mount_json(&server, "GET", "/api/eventos", 200, events()).await;
    mount_json(&server, "GET", "/api/eventos/8", 404, json!({"message": "Evento no encontrado"})).await;
    Mock::given(method("POST"))
        .and(path("/api/sesion/paso"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;
    flow.select_event(8).await;

    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.message(), Some("Evento no encontrado"));
    assert!(flow.selected_event().is_none());
}

#[tokio::test]
async fn opened_event_is_recorded_as_detail_step() {
    let server = MockServer::start().await;
    mount_login(&server, json!({"paso": "LISTADO_EVENTOS"})).await;
    mount_json(&server, "GET", "/api/eventos", 200, events()).await;
    mount_json(&server, "GET", "/api/eventos/7", 200, event_detail()).await;
    Mock::given(method("POST"))
        .and(path("/api/sesion/paso"))
        .and(query_param("paso", "DETALLE_EVENTO"))
        .and(query_param("eventoId", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"paso": "DETALLE_EVENTO", "eventoId": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut flow = controller(&server);
    flow.login("ana", "secreto").await;
    flow.select_event(7).await;

    assert_eq!(flow.screen(), Screen::EventDetail);
}

#[tokio::test]
async fn restart_lands_on_event_list_even_if_list_fails() {
    let server = MockServer::start().await;
    mount_json(&server, "POST", "/api/ventas/realizar", 200, json!({"success": true, "ventaId": 5})).await;
    let mut flow = on_confirmation(&server).await;
    flow.confirm_sale().await;
    assert_eq!(flow.screen(), Screen::Result);

    server.reset().await;
    mount_json(&server, "DELETE", "/api/sesion", 200, json!({})).await;
    mount_json(&server, "GET", "/api/eventos", 503, json!({"message": "Servicio no disponible"})).await;

    flow.start_over().await;

    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.message(), Some("Servicio no disponible"));
    assert!(flow.selected_event().is_none());
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn back_to_list_lands_on_event_list_even_if_list_fails() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/api/eventos/7", 200, event_detail()).await;
    let mut flow = logged_in(&server).await;
    flow.select_event(7).await;
    assert_eq!(flow.screen(), Screen::EventDetail);

    server.reset().await;
    mount_json(&server, "POST", "/api/sesion/paso", 200, json!({})).await;
    mount_json(&server, "GET", "/api/eventos", 500, json!({"descripcion": "Error de base de datos"})).await;

    flow.back().await;

    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.message(), Some("Error de base de datos"));
    assert!(!flow.is_busy());
}

#[tokio::test]
async fn back_walks_the_flow_in_reverse() {
    let server = MockServer::start().await;
    let mut flow = on_confirmation(&server).await;

    flow.back().await;
    assert_eq!(flow.screen(), Screen::PassengerInfo);
    flow.back().await;
    assert_eq!(flow.screen(), Screen::SeatMap);
    flow.back().await;
    assert_eq!(flow.screen(), Screen::EventDetail);
    flow.back().await;
    assert_eq!(flow.screen(), Screen::EventList);
    assert_eq!(flow.events().len(), 2);
}

#[tokio::test]
async fn purchases_are_a_side_screen() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "GET",
        "/api/ventas",
        200,
        json!([{
            "id": 1,
            "eventoId": 7,
            "fechaVenta": "2026-10-01T20:30:00",
            "precioVenta": 3000.0,
            "resultado": true,
            "asientos": [{"fila": 1, "columna": 2}]
        }]),
    )
    .await;
    let mut flow = logged_in(&server).await;

    flow.show_purchases().await;
    assert_eq!(flow.screen(), Screen::Purchases);
    assert_eq!(flow.purchases().len(), 1);
    assert!(flow.purchases()[0].is_approved());
    assert!(flow.purchases()[0].sold_at().is_some());

    flow.back().await;
    assert_eq!(flow.screen(), Screen::EventList);
}

#[tokio::test]
async fn logout_resets_everything() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let mut flow = on_seat_map(&server).await;
    flow.toggle_seat(SeatKey::new(1, 2));

    flow.logout().await;

    assert_eq!(flow.screen(), Screen::Login);
    assert!(!flow.is_authenticated());
    assert!(flow.selection().is_empty());
    assert!(flow.selected_event().is_none());
    assert!(flow.events().is_empty());
    assert!(!flow.is_busy());
}
