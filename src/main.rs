use myshell::flags::Flags;
use myshell::shell::Shell;
use std::env;
use std::process;

fn main() {
    let mut flags = Flags::new();
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = flags.parse(&args) {
        eprintln!("myshell: {}", e);
        flags.print_help();
        process::exit(1);
    }

    if flags.is_set("help") {
        flags.print_help();
        return;
    }

    if flags.is_set("version") {
        println!("myshell {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = myshell::logging::init(flags.is_set("debug"), flags.is_set("quiet")) {
        eprintln!("myshell: {}", e);
    }

    let code = match Shell::new(&flags) {
        Ok(mut shell) => shell.run(),
        Err(e) => {
            log::error!("start-up failed: {}", e);
            eprintln!("myshell: {}", e);
            1
        }
    };
    process::exit(code);
}
