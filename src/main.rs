use std::{
    env, fs,
    io::{self, BufRead, Write},
    process::exit,
};

use tracing_subscriber::EnvFilter;

use bawal_code::{parse, tokenize, Error, Interpreter};

fn run(source: &str) -> Result<String, Error> {
    let tokens = tokenize(source)?;
    let program = parse(&tokens)?;

    let mut interpreter = Interpreter::new();
    interpreter.set_input_callback(|prompt| {
        print!("{} ", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end().to_string())
    });

    Ok(interpreter.interpret(&program)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("Please provide a .bawal file to run.");
        eprintln!("Usage: bawal <filename.bawal>");
        exit(1);
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            exit(1);
        }
    };

    match run(&source) {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("Bawal Error: {}", err);
            exit(1);
        }
    }
}
