use std::env;

use oracle_agent_plugin::oracle::models::{
  PROP_CLIENT_LIB_DIR, PROP_CREDENTIALS, PROP_DRIVER_CLASS, PROP_HOST, PROP_PORT, PROP_PRINCIPAL, PROP_SID,
};
use oracle_agent_plugin::oracle::OracleServerComponent;
use oracle_agent_plugin::plugin::{
  Configuration, MeasurementFacet, MeasurementReport, MeasurementScheduleRequest, OperationFacet, ResourceComponent,
  ResourceContext,
};

/// Environment variables read into the plugin configuration
const ENV_PROPERTIES: &[(&str, &str)] = &[
  ("HOST", PROP_HOST),
  ("PORT", PROP_PORT),
  ("SID", PROP_SID),
  ("DRIVER_CLASS", PROP_DRIVER_CLASS),
  ("PRINCIPAL", PROP_PRINCIPAL),
  ("CREDENTIALS", PROP_CREDENTIALS),
  ("CLIENT_LIB_DIR", PROP_CLIENT_LIB_DIR),
];

fn print_json<T: serde::Serialize>(value: &T) {
  match serde_json::to_string_pretty(value) {
    Ok(s) => println!("{}", s),
    Err(e) => eprintln!("failed to serialize: {}", e),
  }
}

fn usage() {
  eprintln!(
    "Oracle Smoke CLI\n\n\
    Connection settings come from the environment (or a .env file):\n\
      HOST PORT SID DRIVER_CLASS PRINCIPAL CREDENTIALS [CLIENT_LIB_DIR]\n\n\
    Commands:\n\
      avail                                 Report instance availability\n\
      values <name[:trait]>...              Collect metrics (e.g. totalSize open_cursors:trait)\n\
      op <name> [key=value]...              Invoke an operation (e.g. op invokeSql sql='SELECT 1 FROM dual')\n\
    "
  );
}

fn load_configuration() -> Configuration {
  let mut configuration = Configuration::new();
  for (var, property) in ENV_PROPERTIES {
    if let Ok(value) = env::var(var) {
      configuration.put(*property, value);
    }
  }
  if configuration.simple(PROP_DRIVER_CLASS).is_none() {
    configuration.put(PROP_DRIVER_CLASS, "oracle.jdbc.OracleDriver");
  }
  configuration
}

fn start_server() -> Result<OracleServerComponent, i32> {
  let mut server = OracleServerComponent::new();
  match server.start(ResourceContext::new("server", load_configuration())) {
    Ok(()) => Ok(server),
    Err(e) => {
      eprintln!("Start failed: {}", e);
      if let Some(hint) = e.hint() {
        eprintln!("Hint: {}", hint);
      }
      Err(5)
    }
  }
}

fn cmd_avail() -> i32 {
  let mut server = match start_server() { Ok(s) => s, Err(code) => return code };
  print_json(&server.availability());
  server.stop();
  0
}

fn parse_metric(arg: &str) -> MeasurementScheduleRequest {
  match arg.strip_suffix(":trait") {
    Some(name) => MeasurementScheduleRequest::trait_value(name),
    None => MeasurementScheduleRequest::numeric(arg),
  }
}

fn cmd_values(args: &[String]) -> i32 {
  if args.is_empty() {
    eprintln!("Usage: values <name[:trait]>...");
    return 2;
  }
  let metrics: Vec<MeasurementScheduleRequest> = args.iter().map(|a| parse_metric(a)).collect();

  let mut server = match start_server() { Ok(s) => s, Err(code) => return code };
  let mut report = MeasurementReport::new();
  let code = match server.get_values(&mut report, &metrics) {
    Ok(()) => { print_json(&report); 0 }
    Err(e) => { eprintln!("Collection failed: {}", e); 6 }
  };
  server.stop();
  code
}

fn parse_parameters(args: &[String]) -> Result<Configuration, String> {
  let mut parameters = Configuration::new();
  for arg in args {
    match arg.split_once('=') {
      Some((key, value)) => parameters.put(key, value),
      None => return Err(format!("Expected key=value, got '{}'", arg)),
    }
  }
  Ok(parameters)
}

fn cmd_op(args: &[String]) -> i32 {
  let (name, rest) = match args.split_first() {
    Some(split) => split,
    None => { eprintln!("Usage: op <name> [key=value]..."); return 3; }
  };
  let parameters = match parse_parameters(rest) {
    Ok(p) => p,
    Err(e) => { eprintln!("{}", e); return 3; }
  };

  let mut server = match start_server() { Ok(s) => s, Err(code) => return code };
  let code = match server.invoke_operation(name, &parameters) {
    Ok(result) => { print_json(&result); 0 }
    Err(e) => { eprintln!("Operation failed: {}", e); 7 }
  };
  server.stop();
  code
}

fn main() {
  dotenv::dotenv().ok();
  env_logger::init();

  let args: Vec<String> = env::args().collect();
  if args.len() < 2 {
    usage();
    std::process::exit(1);
  }

  let code = match args[1].as_str() {
    "avail" => cmd_avail(),
    "values" => cmd_values(&args[2..]),
    "op" => cmd_op(&args[2..]),
    _ => { usage(); 1 }
  };

  std::process::exit(code);
}
