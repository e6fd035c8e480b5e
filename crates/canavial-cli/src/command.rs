//! Line commands understood by the terminal host.

use canavial_search::{City, Key};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the field's text
    Type(String),
    Key(Key),
    Focus,
    Pick(usize),
    Clear,
    Outside,
    /// Host-side assignment of a city
    Select(City),
    Quit,
    Help,
}

pub const HELP: &str = "\
text            type into the search field
:down / :up     move the highlight
:esc            close the suggestion list
:enter          (no-op) confirm highlight
:focus          reopen the suggestion list
:pick <n>       press suggestion row n
:clear          press the clear control
:outside        click outside the search box
:select <name>;<lat>;<lon>   assign a city from the host
:quit           exit";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, String> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Type(line.to_string()));
    };

    let (name, arg) = match rest.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "down" => Ok(Command::Key(Key::ArrowDown)),
        "up" => Ok(Command::Key(Key::ArrowUp)),
        "esc" => Ok(Command::Key(Key::Escape)),
        "enter" => Ok(Command::Key(Key::Enter)),
        "focus" => Ok(Command::Focus),
        "pick" => arg
            .parse()
            .map(Command::Pick)
            .map_err(|_| format!("invalid row number: {:?}", arg)),
        "clear" => Ok(Command::Clear),
        "outside" => Ok(Command::Outside),
        "select" => parse_city(arg).map(Command::Select),
        "quit" | "q" => Ok(Command::Quit),
        "help" | "h" => Ok(Command::Help),
        other => Err(format!("unknown command :{}", other)),
    }
}

fn parse_city(arg: &str) -> Result<City, String> {
    let parts: Vec<&str> = arg.split(';').map(str::trim).collect();
    let [name, lat, lon] = parts.as_slice() else {
        return Err("expected <name>;<lat>;<lon>".to_string());
    };
    if name.is_empty() {
        return Err("city name is empty".to_string());
    }
    let latitude: f64 = lat
        .parse()
        .map_err(|_| format!("invalid latitude: {:?}", lat))?;
    let longitude: f64 = lon
        .parse()
        .map_err(|_| format!("invalid longitude: {:?}", lon))?;

    Ok(City {
        name: name.to_string(),
        admin1: String::new(),
        country: String::new(),
        latitude,
        longitude,
        timezone: String::new(),
        label: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_typing() {
        assert_eq!(parse("Santos"), Ok(Command::Type("Santos".into())));
        assert_eq!(parse(""), Ok(Command::Type(String::new())));
    }

    #[test]
    fn navigation_commands() {
        assert_eq!(parse(":down"), Ok(Command::Key(Key::ArrowDown)));
        assert_eq!(parse(":up"), Ok(Command::Key(Key::ArrowUp)));
        assert_eq!(parse(":esc"), Ok(Command::Key(Key::Escape)));
        assert_eq!(parse(":pick 2"), Ok(Command::Pick(2)));
        assert!(parse(":pick two").is_err());
    }

    #[test]
    fn select_command() {
        let Ok(Command::Select(city)) = parse(":select Piracicaba; -22.72; -47.64") else {
            panic!("expected select");
        };
        assert_eq!(city.name, "Piracicaba");
        assert_eq!(city.latitude, -22.72);
        assert_eq!(city.display_label(), "Piracicaba");
        assert!(parse(":select Piracicaba").is_err());
        assert!(parse(":select ;1;2").is_err());
    }

    #[test]
    fn unknown_command() {
        assert!(parse(":bogus").is_err());
    }
}
