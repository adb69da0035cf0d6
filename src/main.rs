use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_client::{
    models::{RegisterRequest, SeatKey, SeatStatus},
    ApiClient, Config, FlowController, Screen,
};

const HELP: &str = "\
Comandos:
  login <usuario> <clave>
  register <usuario> <clave> <email> <nombre> <apellido>
  events | open <id> | purchases
  seats | toggle <fila> <columna> | continue
  name <n> <nombre y apellido>
  confirm | buy
  back | refresh | restart | logout | help | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("failed to load configuration")?;

    // Логи в stderr, чтобы не мешать отрисовке экранов в stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting ticket client ({}) against {}",
        config.app.environment, config.api.base_url
    );

    let api = ApiClient::from_config(&config.api).context("failed to build HTTP client")?;
    let mut flow = FlowController::new(api);

    println!("{}", HELP);
    render(&flow);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            continue;
        };

        match (command, args) {
            ("quit" | "exit", _) => break,
            ("help", _) => println!("{}", HELP),
            ("login", [username, password]) => flow.login(username, password).await,
            ("register", [username, password, email, first_name, last_name]) => {
                flow.register(RegisterRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    email: email.to_string(),
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                })
                .await
            }
            ("events", _) => flow.refresh_events().await,
            ("open", [id]) => match id.parse::<i64>() {
                Ok(id) => flow.select_event(id).await,
                Err(_) => println!("Id de evento inválido: {}", id),
            },
            ("seats", _) => flow.open_seat_map(),
            ("toggle", [row, column]) => match (row.parse::<u32>(), column.parse::<u32>()) {
                (Ok(row), Ok(column)) => flow.toggle_seat(SeatKey::new(row, column)),
                _ => println!("Fila y columna deben ser números"),
            },
            ("continue", _) => match flow.screen() {
                Screen::SeatMap => flow.submit_seat_selection().await,
                Screen::PassengerInfo => flow.continue_to_confirmation().await,
                _ => println!("Nada que continuar en esta pantalla"),
            },
            ("name", [index, name @ ..]) if !name.is_empty() => match index.parse::<usize>() {
                // пассажиры нумеруются с 1
                Ok(n) if n > 0 => flow.update_passenger_name(n - 1, &name.join(" ")),
                _ => println!("Número de pasajero inválido: {}", index),
            },
            ("confirm" | "buy", _) => flow.confirm_sale().await,
            ("purchases", _) => match flow.screen() {
                Screen::Purchases => flow.refresh_purchases().await,
                _ => flow.show_purchases().await,
            },
            ("back", _) => flow.back().await,
            ("refresh", _) => match flow.screen() {
                Screen::EventList => flow.refresh_events().await,
                Screen::Purchases => flow.refresh_purchases().await,
                _ => flow.refresh_seats().await,
            },
            ("restart", _) => flow.start_over().await,
            ("logout", _) => flow.logout().await,
            _ => println!("Comando desconocido. Escribe 'help'."),
        }

        render(&flow);
    }

    flow.logout().await;
    info!("Ticket client stopped");
    Ok(())
}

fn render(flow: &FlowController) {
    println!();
    match flow.screen() {
        Screen::Login => {
            println!("== Iniciar sesión ==");
            if let Some(username) = flow.prefill_username() {
                println!("Usuario: {}", username);
            }
        }
        Screen::EventList => {
            println!("== Eventos ({}) ==", flow.username().unwrap_or_default());
            for event in flow.events() {
                println!(
                    "  [{}] {} | {} | {}",
                    event.id,
                    event.title,
                    event.date.as_deref().unwrap_or("-"),
                    price(event.ticket_price)
                );
            }
        }
        Screen::EventDetail => {
            if let Some(event) = flow.selected_event() {
                println!("== {} ==", event.title);
                for line in [&event.summary, &event.description, &event.address, &event.date]
                    .into_iter()
                    .flatten()
                {
                    println!("  {}", line);
                }
                println!("  Precio: {}", price(event.ticket_price));
                println!("  Asientos: {}", event.seat_count());
            }
        }
        Screen::SeatMap => render_seat_map(flow),
        Screen::PassengerInfo => {
            println!("== Datos de pasajeros ==");
            for (index, selection) in flow.selection().as_slice().iter().enumerate() {
                println!("  {}. {} {}", index + 1, selection.seat, selection.passenger_name);
            }
        }
        Screen::Confirmation => {
            println!("== Confirmación ==");
            for selection in flow.selection().as_slice() {
                println!("  {} {}", selection.seat, selection.passenger_name);
            }
            println!("  Total: {}", price(Some(flow.order_total())));
        }
        Screen::Result => {
            println!("== Resultado ==");
            if let Some(sale) = flow.sale_result() {
                let verdict = if sale.is_success() { "Venta realizada" } else { "Venta rechazada" };
                println!("  {}", verdict);
                if let Some(id) = sale.venta_id {
                    println!("  Venta #{}", id);
                }
                for seat in &sale.asientos {
                    println!(
                        "  {} {} ({})",
                        seat.key(),
                        seat.persona.as_deref().unwrap_or_default(),
                        seat.status().label()
                    );
                }
            }
        }
        Screen::Purchases => {
            println!("== Mis compras ==");
            for purchase in flow.purchases() {
                let when = purchase
                    .sold_at()
                    .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let verdict = if purchase.is_approved() { "OK" } else { "Rechazada" };
                println!(
                    "  #{} evento {} | {} | {} | {} asientos | {}",
                    purchase.id,
                    purchase.evento_id,
                    when,
                    price(purchase.precio_venta),
                    purchase.asientos.len(),
                    verdict
                );
            }
        }
    }

    if let Some(message) = flow.message() {
        println!("! {}", message);
    }
}

fn render_seat_map(flow: &FlowController) {
    let map = flow.seat_map();
    println!(
        "== Asientos ({}x{}) | seleccionados {} ==",
        map.rows(),
        map.columns(),
        flow.selection().len()
    );
    if map.is_empty() {
        println!("  Sin mapa de asientos");
        return;
    }

    let cells = flow.seat_cells();
    for row in cells.chunks(map.columns() as usize) {
        let line: String = row
            .iter()
            .map(|cell| match cell.status {
                SeatStatus::Free => '.',
                SeatStatus::Selected => '*',
                SeatStatus::Sold => 'X',
                SeatStatus::Blocked => 'B',
                SeatStatus::Unknown => '?',
            })
            .collect();
        if let Some(first) = row.first() {
            println!("  {:>3} {}", first.seat.row, line);
        }
    }
    println!("  . libre  * seleccionado  X vendido  B bloqueado  ? desconocido");
}

fn price(value: Option<f64>) -> String {
    value
        .map(|amount| format!("${:.2}", amount))
        .unwrap_or_else(|| "-".to_string())
}
