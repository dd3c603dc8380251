use clap::{crate_authors, crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};
use log::{error, info};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use sqlseed::{CreateOutcome, ManagerConfig, ServerConfig, Table};

mod config;

fn query_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(Arg::new("query").required(true).index(1))
}

fn render_table(table: &Table) -> String {
    let mut out = table.columns.join("\t");
    for row in &table.rows {
        out.push('\n');
        out.push_str(
            &row.iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>()
                .join("\t"),
        );
    }
    out
}

fn fail(err: anyhow::Error) -> ! {
    error!("{:?}", err);
    std::process::exit(1);
}

fn required_name(name: &Option<String>) -> &str {
    match name {
        Some(n) => n.as_str(),
        None => fail(anyhow::anyhow!(
            "No database name found, please set the DATABASE_NAME environment variable"
        )),
    }
}

fn query_arg(matches: &ArgMatches) -> &str {
    matches
        .get_one::<String>("query")
        .map(|q| q.as_str())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    let matches = Command::new("sqlseed")
        .about(crate_description!())
        .version(format!("v{}", crate_version!()))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .name("sqlseed")
        .author(crate_authors!())
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .help("The project in sqlseed.toml to use")
                .action(ArgAction::Set)
                .num_args(0..=1),
        )
        .subcommands([
            Command::new("create").about("Create the database from the setup script"),
            Command::new("exists").about("Check if the database exists"),
            Command::new("drop").about("Drop the database"),
            query_command("exec", "Run a statement and print the affected rows"),
            query_command("scalar", "Print the first column of the first row"),
            query_command("query", "Print every row the query returns").arg(
                Arg::new("json")
                    .long("json")
                    .help("Print the rows as JSON")
                    .action(ArgAction::SetTrue),
            ),
        ])
        .get_matches();

    let project = match matches.get_one::<String>("project") {
        Some(project) => match config::load_config_file(project) {
            Ok(p) => p,
            Err(e) => {
                error!("Failed to load config file: {}", e);
                std::process::exit(1);
            }
        },
        None => config::ProjectConfig::default(),
    };

    let admin_url = match project.admin_url.map(Ok).unwrap_or_else(config::admin_url) {
        Ok(url) => url,
        Err(..) => {
            error!("No admin url found, please set the DATABASE_ADMIN_URL environment variable");
            std::process::exit(1);
        }
    };

    let mut server = ServerConfig::new(admin_url)
        .with_batch_separator(config::batch_separator())
        .with_wait_timeout(config::wait_timeout());
    if let Some(url) = project.database_url.or_else(config::database_url) {
        server = server.with_database_url(url);
    }

    let database_name = project.database_name.or_else(config::database_name);
    let script = project.script.unwrap_or_else(config::script_path);

    match matches.subcommand() {
        Some(("create", ..)) => {
            let name = required_name(&database_name);
            let config = ManagerConfig::new(server, name, script);
            match sqlseed::create_database(config).await {
                Err(err) => fail(err),
                Ok(CreateOutcome::Created { statements }) => {
                    info!("Created {} with {} statements", name, statements);
                    info!("Success");
                }
                Ok(CreateOutcome::AlreadyExists) => {
                    info!("{} already exists", name);
                    info!("Success");
                }
            };
        }
        Some(("exists", ..)) => {
            let name = required_name(&database_name);
            match sqlseed::database_exists(server, name).await {
                Err(err) => fail(err),
                Ok(exists) => println!("{}", exists),
            };
        }
        Some(("drop", ..)) => {
            let name = required_name(&database_name);
            match sqlseed::drop_database(server, name).await {
                Err(err) => fail(err),
                Ok(_) => info!("Success"),
            };
        }
        Some(("exec", query_matches)) => {
            let query = query_arg(query_matches);
            match sqlseed::execute_non_query(server, database_name.as_deref(), query).await {
                Err(err) => fail(err),
                Ok(affected) => println!("{}", affected),
            };
        }
        Some(("scalar", query_matches)) => {
            let query = query_arg(query_matches);
            match sqlseed::execute_scalar(server, database_name.as_deref(), query).await {
                Err(err) => fail(err),
                Ok(Some(value)) if !value.is_null() => println!("{}", value),
                Ok(_) => println!("NULL"),
            };
        }
        Some(("query", query_matches)) => {
            let query = query_arg(query_matches);
            let json = query_matches.get_flag("json");
            match sqlseed::execute_reader(server, database_name.as_deref(), query).await {
                Err(err) => fail(err),
                Ok(table) if json => match serde_json::to_string_pretty(&table) {
                    Ok(out) => println!("{}", out),
                    Err(err) => fail(err.into()),
                },
                Ok(table) => println!("{}", render_table(&table)),
            };
        }
        _ => unreachable!(), // If all subcommands are defined above, anything else is unreachable
    }
}
