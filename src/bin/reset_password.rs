use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;

use grex_finances::{
    PasswordHash, User, ValidatedPassword, get_user_by_email, initialize_db, update_password,
};

/// A utility for changing the password for a registered user.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The email address of the user whose password should be reset.
    #[arg(long)]
    email: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        print_error(format!("File does not exist at {db_path:#?}!"));
        exit(1);
    }

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let user = match get_user_by_email(&args.email, &connection) {
        Ok(user) => user,
        Err(error) => {
            print_error(format!("Could not find the user {}: {error}", args.email));
            exit(1);
        }
    };
    println!("Resetting password for {}", user.email);

    let Some(password_hash) = get_new_password_hash(&user) else {
        return Ok(());
    };
    update_password(user.id, &password_hash, &connection)?;

    println!("Password updated successfully!");

    Ok(())
}

fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn get_new_password_hash(user: &User) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt("Enter a new password: ")?;
        let validated_password = match ValidatedPassword::new(&first_password, &[&user.email]) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = prompt("Enter the same password again: ")?;
        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => print_error(format!("Could not hash password: {error}. Try again.")),
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!("\x1b[31;1m{}\x1b[0m", error.to_string());
}
