//! DDL for the two tables. Both statements are idempotent.

/// Employee accounts. `senha` holds a PBKDF2 hash, never the plaintext.
pub const FUNCIONARIO_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS funcionario (
    id SERIAL PRIMARY KEY,
    usuario VARCHAR(255) UNIQUE,
    senha VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE
)";

/// Submitted order batches.
pub const GERENCIA_PEDIDOS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS gerencia_pedidos (
    id SERIAL PRIMARY KEY,
    pedidos INTEGER[] NOT NULL,
    data DATE NOT NULL,
    hora TIME NOT NULL
)";
