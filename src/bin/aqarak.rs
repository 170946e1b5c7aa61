//! Command line front-end for the Aqarak API
//!
//! ```text
//! AQARAK_API_URL=https://api.aqarak.jo AQARAK_SESSION_FILE=~/.aqarak/session.json \
//!     cargo run --features cli --bin aqarak -- search --rent --city Amman
//! ```

use aqarak_client::auth::{guard, GateDecision};
use aqarak_client::chat::ChatPanel;
use aqarak_client::favorites::FavoriteSet;
use aqarak_client::properties::{ListingKind, PropertyCard, SearchFilters, Sort, ViewStatus};
use aqarak_client::valuation::{Estimate, PropertyType, ValuationWizard};
use aqarak_client::{Aqarak, Error};
use clap::{Arg, ArgMatches, Command};
use std::process;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();

    let matches = Command::new("aqarak")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Browse and value properties on Aqarak")
        .subcommand_required(true)
        .subcommand(
            Command::new("login")
                .about("Sign in and store the session")
                .arg(Arg::new("email").required(true))
                .arg(Arg::new("password").required(true)),
        )
        .subcommand(Command::new("logout").about("Forget the stored session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("search")
                .about("Search listings")
                .arg(Arg::new("rent").long("rent").help("Show rentals instead of sales"))
                .arg(Arg::new("query").short('q').long("query").takes_value(true))
                .arg(Arg::new("city").long("city").takes_value(true))
                .arg(Arg::new("type").long("type").takes_value(true))
                .arg(Arg::new("min-price").long("min-price").takes_value(true))
                .arg(Arg::new("max-price").long("max-price").takes_value(true))
                .arg(Arg::new("bedrooms").long("bedrooms").takes_value(true))
                .arg(Arg::new("sort").long("sort").takes_value(true).allow_hyphen_values(true).default_value("-id"))
                .arg(Arg::new("page").long("page").takes_value(true).default_value("1")),
        )
        .subcommand(Command::new("favorites").about("List saved properties"))
        .subcommand(
            Command::new("favorite")
                .about("Save or unsave a property")
                .arg(Arg::new("id").required(true)),
        )
        .subcommand(
            Command::new("predict")
                .about("Estimate a property price")
                .arg(Arg::new("neighborhood").required(true))
                .arg(Arg::new("type").long("type").takes_value(true).default_value("Apartment"))
                .arg(Arg::new("bedrooms").long("bedrooms").takes_value(true))
                .arg(Arg::new("bathrooms").long("bathrooms").takes_value(true))
                .arg(Arg::new("area").long("area").takes_value(true))
                .arg(Arg::new("floor").long("floor").takes_value(true))
                .arg(Arg::new("age").long("age").takes_value(true))
                .arg(Arg::new("unfurnished").long("unfurnished")),
        )
        .subcommand(
            Command::new("chat")
                .about("Ask the assistant a question")
                .arg(Arg::new("question").required(true))
                .arg(Arg::new("property").long("property").takes_value(true)),
        )
        .get_matches();

    if let Err(err) = run(matches).await {
        eprintln!("Error: {}", err.user_message());
        process::exit(1);
    }
}

async fn run(matches: ArgMatches) -> Result<(), Error> {
    let aqarak = Aqarak::from_env()?;
    aqarak.init()?;

    match matches.subcommand() {
        Some(("login", args)) => {
            let session = aqarak
                .auth()
                .login(required(args, "email")?, required(args, "password")?)
                .await?;
            println!("Signed in as {}", session.user.email);
        }
        Some(("logout", _)) => {
            aqarak.auth().logout();
            println!("Signed out");
        }
        Some(("whoami", _)) => {
            require_login(&aqarak, "/profile")?;
            let user = aqarak.auth().get_user().await?;
            println!("{} <{}>", user.name.as_deref().unwrap_or("-"), user.email);
        }
        Some(("search", args)) => search(&aqarak, args).await?,
        Some(("favorites", _)) => {
            require_login(&aqarak, "/saved")?;
            for property in aqarak.favorites().list().await? {
                print_card(&PropertyCard::from(&property));
            }
        }
        Some(("favorite", args)) => {
            require_login(&aqarak, "/saved")?;
            let id = parse::<i64>(args, "id")?.unwrap_or_default();
            let favorites = aqarak.favorites();
            let mut saved = FavoriteSet::new();
            saved.load(&favorites).await?;
            let now_saved = saved.toggle(&favorites, id).await?;
            println!("{} {}", if now_saved { "Saved" } else { "Removed" }, id);
        }
        Some(("predict", args)) => predict(&aqarak, args).await?,
        Some(("chat", args)) => {
            require_login(&aqarak, "/chat")?;
            let mut panel = match parse::<i64>(args, "property")? {
                Some(id) => ChatPanel::for_property(id),
                None => ChatPanel::new(),
            };
            panel.submit(&aqarak.chat(), required(args, "question")?).await;
            if let Some(reply) = panel.messages().last() {
                println!("{}", reply.content);
            }
        }
        _ => unreachable!("subcommand required"),
    }

    Ok(())
}

async fn search(aqarak: &Aqarak, args: &ArgMatches) -> Result<(), Error> {
    let kind = if args.is_present("rent") {
        ListingKind::Rent
    } else {
        ListingKind::Sale
    };

    let mut filters = SearchFilters::new()
        .with_price_range(parse(args, "min-price")?, parse(args, "max-price")?)
        .with_bedrooms(parse(args, "bedrooms")?, None);
    filters.q = args.value_of("query").map(str::to_string);
    filters.city = args.value_of("city").map(str::to_string);
    filters.property_type = args.value_of("type").map(str::to_string);

    let mut view = aqarak.search_view(Some(kind));
    view.set_filters(filters);
    view.set_sort(required(args, "sort")?.parse::<Sort>()?);

    let properties = aqarak.properties();
    view.refresh(&properties).await;

    let page = parse::<u32>(args, "page")?.unwrap_or(1);
    if view.go_to_page(page) {
        view.refresh(&properties).await;
    }

    match view.status() {
        ViewStatus::Failed(message) => return Err(Error::general(message)),
        ViewStatus::Empty => println!("No properties found matching your criteria."),
        _ => {
            for property in view.items() {
                print_card(&PropertyCard::from(property));
            }
            println!(
                "Page {} of {} ({} results)",
                view.page(),
                view.total_pages(),
                view.total()
            );
        }
    }
    Ok(())
}

async fn predict(aqarak: &Aqarak, args: &ArgMatches) -> Result<(), Error> {
    let mut wizard = ValuationWizard::new();

    if let Some(form) = wizard.form_mut() {
        form.neighborhood = required(args, "neighborhood")?.to_string();
        form.property_type = required(args, "type")?.parse::<PropertyType>()?;
        form.furnished = !args.is_present("unfurnished");
        if let Some(v) = parse(args, "bedrooms")? {
            form.bedrooms = v;
        }
        if let Some(v) = parse(args, "bathrooms")? {
            form.bathrooms = v;
        }
        if let Some(v) = parse(args, "area")? {
            form.area_sqm = v;
        }
        if let Some(v) = parse(args, "floor")? {
            form.floor = v;
            form.total_floors = v;
        }
        if let Some(v) = parse(args, "age")? {
            form.building_age = v;
        }
    }

    wizard.advance()?;
    match wizard.submit(&aqarak.valuation()).await? {
        Estimate::Ready(price) => println!("Estimated price: {:.0} JOD", price),
        Estimate::Failed(message) => return Err(Error::general(message)),
        _ => {}
    }
    Ok(())
}

fn require_login(aqarak: &Aqarak, destination: &str) -> Result<(), Error> {
    match guard(aqarak.auth_state(), destination) {
        GateDecision::Render => Ok(()),
        _ => Err(Error::auth("Please log in first: aqarak login <email> <password>")),
    }
}

fn print_card(card: &PropertyCard) {
    println!(
        "#{} {} | {:.0} JOD | {}{}",
        card.id,
        card.title,
        card.display_price,
        card.tags.join(", "),
        if card.is_favorited { " ★" } else { "" }
    );
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str, Error> {
    args.value_of(name)
        .ok_or_else(|| Error::validation(format!("Missing argument: {}", name)))
}

fn parse<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, Error> {
    match args.value_of(name) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::validation(format!("Invalid value for {}: {}", name, raw))),
        None => Ok(None),
    }
}
