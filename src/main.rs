// blang: syntax checker for the B programming language

use std::env;
use std::process;

use blang::lexer::Lexer;
use blang::recognizer::Recognizer;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("blang");
        eprintln!("Usage: {} <file.b>", program_name);
        process::exit(1);
    }

    let path = match env::current_dir() {
        Ok(cwd) => cwd.join(&args[1]),
        Err(e) => {
            eprintln!("Error: cannot resolve working directory: {}", e);
            process::exit(1);
        }
    };

    let mut lexer = match Lexer::from_path(&path) {
        Ok(lexer) => lexer,
        Err(e) => {
            eprintln!("Error: cannot open '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    let tokens = match lexer.tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    let mut recognizer = Recognizer::new(tokens);
    let accepted = recognizer.run();

    println!("{}", recognizer.furthest());

    if !accepted {
        eprintln!(
            "{}: syntax error near token {}",
            args[1],
            recognizer.furthest()
        );
        process::exit(1);
    }
}
