mod command;

use std::sync::Arc;

use anyhow::{Context, Result};
use canavial_core::{Config, ConfigError};
use canavial_search::{
    City, CitySearchBox, HttpCityLookup, Point, PointerEvent, PointerKind, Rect, SearchHost,
    SearchMessage,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use command::Command;

/// Terminal stand-in for the dashboard: remembers the chosen city.
#[derive(Debug, Default)]
struct Dashboard {
    city: Option<City>,
}

impl SearchHost for Dashboard {
    fn on_city_select(&mut self, city: &City) {
        println!(
            "-> dashboard city: {} ({:.4}, {:.4}) {}",
            city.display_label(),
            city.latitude,
            city.longitude,
            city.timezone
        );
        self.city = Some(city.clone());
    }

    fn on_clear(&mut self) {
        println!("-> dashboard cleared");
        self.city = None;
    }
}

enum Input {
    Line(std::io::Result<Option<String>>),
    Message(SearchMessage),
}

// Fixed layout: the search box occupies the top strip of a 100x40 screen.
const SEARCH_BOUNDS: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 100.0,
    height: 12.0,
};
const INSIDE: Point = Point { x: 1.0, y: 1.0 };
const OUTSIDE: Point = Point { x: 50.0, y: 30.0 };

#[tokio::main]
async fn main() -> Result<()> {
    canavial_core::init()?;

    let (config, _) = match Config::load_validated() {
        Ok(loaded) => loaded,
        Err(e) => {
            if let Some(config_err) = e.downcast_ref::<ConfigError>() {
                eprintln!("{}", config_err.user_message());
            }
            return Err(e);
        }
    };
    tracing::info!("City lookup endpoint: {}", config.search.endpoint_url);

    let lookup = HttpCityLookup::new(&config.search).context("Failed to create city lookup")?;
    let mut search = CitySearchBox::mount(Arc::new(lookup), Dashboard::default(), &config.search);
    search.set_bounds(SEARCH_BOUNDS);

    println!("Canavial - busca de cidades (:help for commands)");
    print!("{}", search.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line),
            Some(message) = search.next_message() => Input::Message(message),
        };

        match input {
            Input::Message(message) => {
                search.handle_message(message);
            }
            Input::Line(line) => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let cmd = match command::parse(&line) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };
                if !apply(&mut search, cmd) {
                    break;
                }
            }
        }

        print!("{}", search.view());
    }

    let dashboard = search.unmount();
    if let Some(city) = dashboard.city {
        tracing::info!("Exiting with {} selected", city.display_label());
    }
    Ok(())
}

/// Forward one command to the search box. Returns false to quit.
fn apply(search: &mut CitySearchBox<HttpCityLookup, Dashboard>, cmd: Command) -> bool {
    match cmd {
        Command::Type(text) => search.input_changed(text),
        Command::Key(key) => search.key_down(key),
        Command::Focus => search.focus_gained(),
        Command::Pick(index) => {
            let mut press = PointerEvent::new(PointerKind::Pointer, INSIDE);
            if !search.suggestion_pressed(index, &mut press) {
                eprintln!("no suggestion row {}", index);
            }
            search.pointer_down(&press);
        }
        Command::Clear => {
            search.clear_pressed();
        }
        Command::Outside => {
            search.pointer_down(&PointerEvent::new(PointerKind::Mouse, OUTSIDE));
        }
        Command::Select(city) => search.set_selected_city(Some(city)),
        Command::Help => println!("{}", command::HELP),
        Command::Quit => return false,
    }
    true
}
