//! Initial database schema migration.
//!
//! Creates the clients, loans, installments, cash sessions, payments,
//! receipts, and late-fee rate tables with their enums and indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(CLIENTS_SQL).await?;
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(CASH_SESSIONS_SQL).await?;
        db.execute_unprepared(PAYMENTS_SQL).await?;
        db.execute_unprepared(RECEIPTS_SQL).await?;
        db.execute_unprepared(SETTINGS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE document_type AS ENUM ('dni', 'ruc');
CREATE TYPE loan_frequency AS ENUM ('daily', 'weekly', 'biweekly', 'monthly');
CREATE TYPE loan_status AS ENUM ('active', 'paid', 'cancelled');
CREATE TYPE installment_status AS ENUM ('pending', 'partial', 'paid');
CREATE TYPE payment_method AS ENUM ('cash', 'card', 'yape', 'plin', 'flow', 'mercadopago');
CREATE TYPE payment_status AS ENUM ('approved', 'voided');
CREATE TYPE settlement_kind AS ENUM ('full', 'partial');
CREATE TYPE receipt_kind AS ENUM ('boleta', 'factura');
";

const CLIENTS_SQL: &str = r"
CREATE TABLE clients (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    document_type document_type NOT NULL,
    document_number VARCHAR(11) NOT NULL,
    full_name VARCHAR(255) NOT NULL,
    address TEXT,
    phone VARCHAR(20),
    email VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_clients_document UNIQUE (document_number),
    CONSTRAINT chk_clients_document_length CHECK (
        (document_type = 'dni' AND document_number ~ '^[0-9]{8}$')
        OR (document_type = 'ruc' AND document_number ~ '^[0-9]{11}$')
    )
);

CREATE INDEX idx_clients_name ON clients(full_name);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    client_id UUID NOT NULL REFERENCES clients(id),
    principal NUMERIC(14, 2) NOT NULL,
    interest_percent NUMERIC(7, 2) NOT NULL DEFAULT 0,
    installment_count INTEGER NOT NULL,
    frequency loan_frequency NOT NULL DEFAULT 'monthly',
    start_date DATE NOT NULL,
    total_amount NUMERIC(14, 2) NOT NULL,
    installment_amount NUMERIC(14, 2) NOT NULL,
    status loan_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    closed_at TIMESTAMPTZ,
    CONSTRAINT chk_loans_principal_positive CHECK (principal > 0),
    CONSTRAINT chk_loans_interest_non_negative CHECK (interest_percent >= 0),
    CONSTRAINT chk_loans_installments_positive CHECK (installment_count > 0)
);

-- One active loan per client
CREATE UNIQUE INDEX uq_loans_active_client ON loans(client_id) WHERE status = 'active';

CREATE INDEX idx_loans_status ON loans(status, created_at DESC);

CREATE TABLE installments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    loan_id UUID NOT NULL REFERENCES loans(id) ON DELETE CASCADE,
    client_id UUID NOT NULL REFERENCES clients(id),
    sequence INTEGER NOT NULL,
    due_date DATE NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    balance NUMERIC(14, 2) NOT NULL,
    status installment_status NOT NULL DEFAULT 'pending',
    is_paid BOOLEAN NOT NULL DEFAULT false,
    paid_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_installments_sequence UNIQUE (loan_id, sequence),
    CONSTRAINT chk_installments_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_installments_balance_range CHECK (balance >= 0 AND balance <= amount)
);

-- Overdue scans only look at unpaid rows
CREATE INDEX idx_installments_unpaid_due ON installments(due_date) WHERE NOT is_paid;
";

const CASH_SESSIONS_SQL: &str = r"
CREATE TABLE cash_sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    opened_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    opened_by VARCHAR(100),
    opening_float NUMERIC(14, 2) NOT NULL DEFAULT 0,
    is_open BOOLEAN NOT NULL DEFAULT true,
    closed_at TIMESTAMPTZ,
    closed_by VARCHAR(100),
    counted_cash NUMERIC(14, 2),
    expected_cash NUMERIC(14, 2),
    variance NUMERIC(14, 2),
    cash_total NUMERIC(14, 2),
    digital_total NUMERIC(14, 2),
    CONSTRAINT chk_cash_sessions_float CHECK (opening_float >= 0),
    CONSTRAINT chk_cash_sessions_closed CHECK (is_open OR closed_at IS NOT NULL)
);

-- At most one open drawer
CREATE UNIQUE INDEX uq_cash_sessions_open ON cash_sessions(is_open) WHERE is_open;
";

const PAYMENTS_SQL: &str = r"
CREATE TABLE payments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    installment_id UUID NOT NULL REFERENCES installments(id),
    loan_id UUID NOT NULL REFERENCES loans(id),
    client_id UUID NOT NULL REFERENCES clients(id),
    cash_session_id UUID REFERENCES cash_sessions(id),
    method payment_method NOT NULL,
    status payment_status NOT NULL DEFAULT 'approved',
    settlement settlement_kind NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    amount_received NUMERIC(14, 2) NOT NULL,
    change_given NUMERIC(14, 2) NOT NULL DEFAULT 0,
    overpayment NUMERIC(14, 2) NOT NULL DEFAULT 0,
    principal_applied NUMERIC(14, 2) NOT NULL,
    fee_applied NUMERIC(14, 2) NOT NULL DEFAULT 0,
    fee_waived NUMERIC(14, 2) NOT NULL DEFAULT 0,
    late_fee_rate NUMERIC(5, 2) NOT NULL,
    balance_before NUMERIC(14, 2) NOT NULL,
    balance_after NUMERIC(14, 2) NOT NULL,
    external_reference VARCHAR(100),
    payer_email VARCHAR(255),
    paid_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    voided_at TIMESTAMPTZ,
    void_reason TEXT,
    voided_by VARCHAR(100),
    CONSTRAINT chk_payments_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_payments_received CHECK (amount_received >= amount),
    CONSTRAINT chk_payments_excess CHECK (change_given + overpayment = amount_received - amount),
    CONSTRAINT chk_payments_balances CHECK (balance_after >= 0 AND balance_after <= balance_before),
    CONSTRAINT chk_payments_void CHECK (status = 'approved' OR voided_at IS NOT NULL)
);

-- Gateway redelivery becomes a duplicate
CREATE UNIQUE INDEX uq_payments_external_reference
    ON payments(method, external_reference) WHERE external_reference IS NOT NULL;

CREATE INDEX idx_payments_installment ON payments(installment_id, paid_at DESC);
CREATE INDEX idx_payments_session ON payments(cash_session_id) WHERE status = 'approved';
";

const RECEIPTS_SQL: &str = r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_id UUID NOT NULL REFERENCES payments(id),
    kind receipt_kind NOT NULL,
    series VARCHAR(4) NOT NULL,
    number BIGINT GENERATED BY DEFAULT AS IDENTITY,
    client_name VARCHAR(255) NOT NULL,
    document_type document_type NOT NULL,
    document_number VARCHAR(11) NOT NULL,
    client_email VARCHAR(255),
    installment_sequence INTEGER NOT NULL,
    method payment_method NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    principal_applied NUMERIC(14, 2) NOT NULL,
    fee_applied NUMERIC(14, 2) NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_receipts_payment UNIQUE (payment_id),
    CONSTRAINT uq_receipts_number UNIQUE (series, number)
);
";

const SETTINGS_SQL: &str = r"
-- Append-only late-fee rate history; the newest row wins
CREATE TABLE late_fee_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    rate_percent NUMERIC(5, 2) NOT NULL,
    effective_from TIMESTAMPTZ NOT NULL DEFAULT now(),
    set_by VARCHAR(100),
    CONSTRAINT chk_late_fee_rate_range CHECK (rate_percent >= 0 AND rate_percent <= 100)
);

CREATE INDEX idx_late_fee_rates_effective ON late_fee_rates(effective_from DESC);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS late_fee_rates CASCADE;
DROP TABLE IF EXISTS receipts CASCADE;
DROP TABLE IF EXISTS payments CASCADE;
DROP TABLE IF EXISTS cash_sessions CASCADE;
DROP TABLE IF EXISTS installments CASCADE;
DROP TABLE IF EXISTS loans CASCADE;
DROP TABLE IF EXISTS clients CASCADE;

DROP TYPE IF EXISTS receipt_kind;
DROP TYPE IF EXISTS settlement_kind;
DROP TYPE IF EXISTS payment_status;
DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS installment_status;
DROP TYPE IF EXISTS loan_status;
DROP TYPE IF EXISTS loan_frequency;
DROP TYPE IF EXISTS document_type;
";
