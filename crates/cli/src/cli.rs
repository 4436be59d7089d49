use clap::{Args, Parser, Subcommand};
use gerencia_core::types::DbId;

#[derive(Parser, Debug)]
#[command(
    name = "gerencia",
    version,
    about = "Employee credentials and order batches stored in PostgreSQL"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the funcionario and gerencia_pedidos tables if missing
    Init,

    /// Check that PostgreSQL answers and print its version
    Health,

    /// Create an employee account
    CreateAccount(CreateAccountArgs),

    /// Print the recovery email of an account
    LookupEmail {
        usuario: String,
    },

    /// Check a username and password pair
    Verify {
        usuario: String,

        /// Read from GERENCIA_SENHA when not given
        #[arg(long, env = "GERENCIA_SENHA", hide_env_values = true)]
        senha: String,
    },

    /// Replace the password of the account owning EMAIL with a random one
    ResetPassword {
        email: String,
    },

    /// Overwrite the password of an account
    ChangePassword {
        usuario: String,

        #[arg(long, env = "GERENCIA_SENHA", hide_env_values = true)]
        senha: String,
    },

    /// Record an order batch
    InsertOrder(InsertOrderArgs),

    /// Print one order batch
    GetOrder {
        id: DbId,
    },

    /// Print every order batch
    ListOrders,
}

#[derive(Args, Debug)]
pub struct CreateAccountArgs {
    /// Raw payload: {"usuario": ..., "senha": ..., "email": ...}
    #[arg(long, conflicts_with_all = ["usuario", "senha", "email"])]
    pub json: Option<String>,

    #[arg(long, required_unless_present = "json")]
    pub usuario: Option<String>,

    #[arg(
        long,
        env = "GERENCIA_SENHA",
        hide_env_values = true,
        required_unless_present = "json"
    )]
    pub senha: Option<String>,

    #[arg(long, required_unless_present = "json")]
    pub email: Option<String>,
}

#[derive(Args, Debug)]
pub struct InsertOrderArgs {
    /// Raw payload: {"pedidos": [1, 2], "data": "YYYY-MM-DD", "hora": "HH:MM:SS"}
    #[arg(long, conflicts_with_all = ["pedidos", "data", "hora"])]
    pub json: Option<String>,

    /// Item ids, comma separated
    #[arg(long, value_delimiter = ',', required_unless_present = "json")]
    pub pedidos: Vec<i32>,

    /// Date as YYYY-MM-DD
    #[arg(long, required_unless_present = "json")]
    pub data: Option<String>,

    /// Time as HH:MM:SS
    #[arg(long, required_unless_present = "json")]
    pub hora: Option<String>,
}
