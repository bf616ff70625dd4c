use std::{env, process::exit};

use reg_automaton::{
    matching::Matcher, CompileFlags, CompileOptions, Compiler, GraphDescription,
};

fn flag_from_env(name: &str) -> bool {
    matches!(env::var(name).as_deref(), Ok("1") | Ok("true"))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((pattern, inputs)) = args.split_first() else {
        eprintln!("usage: reg_automaton PATTERN [STRING...]");
        exit(1);
    };

    let mut options = CompileOptions::default();
    if flag_from_env("REG_AUTOMATON_LEGACY") {
        options = CompileOptions::legacy();
    }
    if flag_from_env("REG_AUTOMATON_LAX_PLUS") {
        options.flags.remove(CompileFlags::STRICT_PLUS);
    }

    match Compiler::new(options).compile(pattern) {
        Ok(automaton) => {
            print!("{}", GraphDescription::from_automaton(&automaton).to_dot());
            for input in inputs {
                let verdict = if automaton.is_match(input) {
                    "accepted"
                } else {
                    "rejected"
                };
                eprintln!("{:?}: {}", input, verdict);
            }
        }
        Err(err) => {
            eprintln!("{}", err.report(pattern.trim()));
            exit(2);
        }
    }
}
