//! Chart of accounts: the standard chart, seeding, validation and lookup.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use model::AccountKind;
use model::entities::{account, period_override};

use crate::error::{ComputeError, Result};
use crate::formula::{Formula, FormulaError};

type ChartLine = (
    i32,
    &'static str,
    Option<&'static str>,
    AccountKind,
    Option<&'static str>,
    Option<i32>,
);

use AccountKind::{Balance, IncomeStatement, WorkingCapital};

const DISPONIVEL: Option<&str> = Some("DISPONÍVEL");
const CREDITOS: Option<&str> = Some("CRÉDITOS");
const ESTOQUES: Option<&str> = Some("ESTOQUES");
const ATIVO_NC: Option<&str> = Some("ATIVO NÃO CIRCULANTE");
const PASSIVO_C: Option<&str> = Some("PASSIVO CIRCULANTE");
const PASSIVO_NC: Option<&str> = Some("PASSIVO NÃO CIRCULANTE");
const LIQUIDEZ: Option<&str> = Some("LIQUIDEZ");

#[rustfmt::skip]
const STANDARD_CHART: &[ChartLine] = &[
    // Income statement (DRE)
    (1, "Receita Operacional", None, IncomeStatement, None, None),
    (2, "Impostos Sobre Vendas", None, IncomeStatement, None, None),
    (3, "Comissões Sobre Vendas", None, IncomeStatement, None, None),
    (4, "Papeis e Cartões", None, IncomeStatement, None, None),
    (5, "Chapas Offset", None, IncomeStatement, None, None),
    (6, "Tintas e Vernizes", None, IncomeStatement, None, None),
    (7, "Embalagem.(cxs/plast./strech/ fitas,)", None, IncomeStatement, None, None),
    (8, "Industrialização de Terceiros", None, IncomeStatement, None, None),
    (9, "Tampa Plástica/Peças Máquinas Selar", None, IncomeStatement, None, None),
    (10, "Materia prima Indireta / Auxiliar", None, IncomeStatement, None, None),
    (11, "Frete Matéria Prima", None, IncomeStatement, None, None),
    (12, "Frete s/ Vendas", None, IncomeStatement, None, None),
    (13, "Despesas Financeiras", None, IncomeStatement, None, None),
    (14, "Marketing - Octadesck/Facebook/Google", None, IncomeStatement, None, None),
    (15, "Custo Variável", None, IncomeStatement, Some("2+3+4+5+6+7+8+9+10+11+12+13+14"), None),
    (16, "Margem de Contribuição", None, IncomeStatement, Some("1-15"), None),
    (17, "Total Custo Fixo", None, IncomeStatement, None, None),
    (18, "Resultado Operacional", None, IncomeStatement, Some("16-17"), None),
    (19, "Extorno da Despesa Financeira", None, IncomeStatement, None, None),
    (20, "Extorno da Depreciação", None, IncomeStatement, None, None),
    (21, "EBITDA", None, IncomeStatement, Some("18+19+20"), None),
    (22, "Receitas não Operacionais", None, IncomeStatement, None, None),
    (23, "Despesas não Operacionais", None, IncomeStatement, None, None),
    (24, "Pagamento de Imobilizações", None, IncomeStatement, None, None),
    (25, "Parcelamento de Impostos", None, IncomeStatement, None, None),
    (26, "Amortização de Emprestimos", None, IncomeStatement, None, None),
    (27, "FLUXO CAIXA", None, IncomeStatement, Some("18+22-23-24-25-26"), None),
    (28, "FLUXO DE CAIXA LIVRE", None, IncomeStatement, Some("ACCUMULATED"), Some(27)),
    // Balance sheet
    (29, "CAIXINHA", DISPONIVEL, Balance, None, None),
    (30, "SICOOB", DISPONIVEL, Balance, None, None),
    (31, "BRB", DISPONIVEL, Balance, None, None),
    (32, "BANCO DO BRASIL", DISPONIVEL, Balance, None, None),
    (33, "IPAG", DISPONIVEL, Balance, None, None),
    (34, "SANTANDER", DISPONIVEL, Balance, None, None),
    (35, "BRADESCO", DISPONIVEL, Balance, None, None),
    (36, "SICOOB _ APLICAÇÃO", DISPONIVEL, Balance, None, None),
    (37, "TOTAL DISPONÍVEL", DISPONIVEL, Balance, Some("29+30+31+32+33+34+35+36"), None),
    (38, "DUPL. A RECEBER VENCIDAS", CREDITOS, Balance, None, None),
    (39, "DUPLICATAS A RECEBER A VENCER", CREDITOS, Balance, None, None),
    (40, "(-) PENDÊNCIAS JUDICIAIS", CREDITOS, Balance, None, None),
    (41, "CIELO / REDE", CREDITOS, Balance, None, None),
    (42, "ADIANTAMENTOS A EMPREGADOS", CREDITOS, Balance, None, None),
    (43, "ADIANTAMENTOS A FORNECEDORES", CREDITOS, Balance, None, None),
    (44, "IMPOSTOS A RECUPERAR", CREDITOS, Balance, None, None),
    (45, "TOTAL CRÉDITOS", CREDITOS, Balance, Some("38+39+40+41+42+43+44"), None),
    (46, "MATERIA PRIMA", ESTOQUES, Balance, None, None),
    (47, "TAMPAS", ESTOQUES, Balance, None, None),
    (48, "PROD. EM ELABORAÇÃO ( 56 %)", ESTOQUES, Balance, None, None),
    (49, "PRODUTOS ACABADOS ( 70%)", ESTOQUES, Balance, None, None),
    (50, "COMPONENTES MAQUINAS SELAR", ESTOQUES, Balance, None, None),
    (51, "TOTAL ESTOQUES", ESTOQUES, Balance, Some("46+47+48+49+50"), None),
    (52, "TOTAL DO ATIVO CIRCULANTE", ESTOQUES, Balance, Some("37+45+51"), None),
    (53, "MAQUINAS E EQUIP/VEÍCULOS", ATIVO_NC, Balance, None, None),
    (54, "MAQUINAS COMODATO", ATIVO_NC, Balance, None, None),
    (55, "CONSÓRCIOS", ATIVO_NC, Balance, None, None),
    (56, "TOTAL DO ATIVO NÃO CIRCULANTE", ATIVO_NC, Balance, Some("53+54+55"), None),
    (57, "TOTAL DO ATIVO", ATIVO_NC, Balance, Some("52+56"), None),
    (58, "FORNECEDORES", PASSIVO_C, Balance, None, None),
    (59, "CONTAS A PAGAR", PASSIVO_C, Balance, None, None),
    (60, "SALÁRIOS A PAGAR", PASSIVO_C, Balance, None, None),
    (61, "COMISSÕES A PAGAR", PASSIVO_C, Balance, None, None),
    (62, "OBRIG.TRAB/PREV. (INSS,FGTS )", PASSIVO_C, Balance, None, None),
    (63, "PARC. DE IMPOSTOS/ CONTRIBUIÇÕES", PASSIVO_C, Balance, None, None),
    (64, "OBRIG. TRIBUT. (ISS,PIS,COFINS,IRRF,IRPJ)", PASSIVO_C, Balance, None, None),
    (65, "FINANC. DE ATIVO CIRCULANTE", PASSIVO_C, Balance, None, None),
    (66, "PROVISÃO P/ FÉRIAS", PASSIVO_C, Balance, None, None),
    (67, "PROVISÃO P/ 13º SALARIO", PASSIVO_C, Balance, None, None),
    (68, "CONSÓRCIO VEÍCULOS", PASSIVO_C, Balance, None, None),
    (69, "FINANCIAMENTO DE ATIVO PERMANENTE", PASSIVO_C, Balance, None, None),
    (70, "ANTECIPAÇÃO DE CLIENTES (SITE)", PASSIVO_C, Balance, None, None),
    (71, "TOTAL DO PASSIVO CIRCULANTE", PASSIVO_C, Balance, Some("58+59+60+61+62+63+64+65+66+67+68+69+70"), None),
    (72, "FINANC. DE ATIVO PERMANENTE ( CONSÓRCIOS)", PASSIVO_NC, Balance, None, None),
    (73, "FINANC. DE ATIVO CIRCULANTE", PASSIVO_NC, Balance, None, None),
    (74, "FINANCIAMENTO DE ATIVO PERMANENTE", PASSIVO_NC, Balance, None, None),
    (75, "PARC. DE IMPOSTOS", PASSIVO_NC, Balance, None, None),
    (76, "IMPOST A REGULARIZAR ( IPTU, ISS, PIS, COFINS)", PASSIVO_NC, Balance, None, None),
    (77, "CONTR. A REGULARIZAR ( INSS, FGTS,IRRF)", PASSIVO_NC, Balance, None, None),
    (78, "EMPRES. TERCEIRO (JULIO/SR.ROMEU/BENEDITO)", PASSIVO_NC, Balance, None, None),
    (79, "ENEL ENERGIA A REGULARIZAR", PASSIVO_NC, Balance, None, None),
    (80, "FCO - BANCO DO BRASIL (LOG)", PASSIVO_NC, Balance, None, None),
    (81, "TOTAL DO PASSIVO NÃO CIRCULANTE", PASSIVO_NC, Balance, Some("72+73+74+75+76+77+78+79+80"), None),
    (82, "TOTAL DO PATRIMONIO LIQUIDO", LIQUIDEZ, Balance, Some("57-71-81"), None),
    (83, "TOTAL DO PASSIVO", LIQUIDEZ, Balance, Some("71+81+82"), None),
    (84, "LIQUIDEZ CORRENTE", LIQUIDEZ, Balance, Some("52/71"), None),
    (85, "LIQUIDEZ SECA", LIQUIDEZ, Balance, Some("(52-51-42-43)/71"), None),
    (86, "LIQUIDEZ IMEDIATA", LIQUIDEZ, Balance, Some("37/71"), None),
    (87, "CAPITAL CIRCULANTE", LIQUIDEZ, Balance, Some("52-71"), None),
    // Working capital
    (88, "NECESSIDADE DE CAPITAL DE GIRO", Some("NCG"), WorkingCapital, Some("38+39+41+42+51+43"), None),
    (89, "SUSTENTAÇÃO", Some("SUSTENTACAO"), WorkingCapital, Some("58+59+60+61+62+64+70"), None),
    (90, "NECESSIDADE LÍQUIDA DE CAPITAL DE GIRO", Some("NCG_LIQUIDA"), WorkingCapital, Some("88-89"), None),
    (91, "TESOURARIA", Some("TESOURARIA"), WorkingCapital, Some("90-37"), None),
    (92, "DEFICIT A REGULARIZAR", Some("DEFICIT"), WorkingCapital, Some("61+95"), None),
    (95, "COMPRAS", Some("COMPRAS"), WorkingCapital, None, None),
    (101, "RECEITA ACUMULADA ANUAL", None, IncomeStatement, Some("ACCUMULATED_ANNUAL"), Some(1)),
];

/// Reconciled figures that replace the formula result of free cash flow
/// (27) and its running balance (28) for January to April 2025.
const STANDARD_OVERRIDES: &[(i32, u32, i32, f64)] = &[
    (27, 1, 2025, -808_491.83),
    (27, 2, 2025, -97_556.96),
    (27, 3, 2025, -135_813.53),
    (27, 4, 2025, -128_647.21),
    (28, 1, 2025, -418_423.17),
    (28, 2, 2025, -515_980.13),
    (28, 3, 2025, -605_324.75),
    (28, 4, 2025, -733_971.96),
];

const RECONCILED_NOTE: &str = "reconciled historical figure";

/// The standard chart of accounts, in ascending id order.
pub fn standard_chart() -> Vec<account::Model> {
    STANDARD_CHART
        .iter()
        .map(|&(id, name, group_name, kind, formula, recurrence_source_id)| account::Model {
            id,
            name: name.to_string(),
            group_name: group_name.map(str::to_string),
            kind,
            formula: formula.map(str::to_string),
            is_manual: formula.is_none(),
            recurrence_source_id,
        })
        .collect()
}

/// A seeded override row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverrideSeed {
    pub account_id: i32,
    pub month: u32,
    pub year: i32,
    pub value: f64,
}

pub fn standard_overrides() -> Vec<OverrideSeed> {
    STANDARD_OVERRIDES
        .iter()
        .map(|&(account_id, month, year, value)| OverrideSeed {
            account_id,
            month,
            year,
            value,
        })
        .collect()
}

/// Inserts the standard chart and its overrides into an empty database.
///
/// Returns the number of accounts inserted, `0` when accounts already exist.
#[instrument(skip(db))]
pub async fn seed_standard_chart(db: &DatabaseConnection) -> Result<usize> {
    let existing = account::Entity::find().count(db).await?;
    if existing > 0 {
        info!("Chart of accounts already present ({} accounts), skipping seed", existing);
        return Ok(0);
    }

    let chart = standard_chart();
    let issues = validate_chart(&chart);
    if !issues.is_empty() {
        for issue in &issues {
            warn!("Standard chart issue: {}", issue);
        }
        return Err(ComputeError::InvalidChart(issues.len()));
    }

    let txn = db.begin().await?;
    account::Entity::insert_many(chart.iter().cloned().map(|model| account::ActiveModel {
        id: Set(model.id),
        name: Set(model.name),
        group_name: Set(model.group_name),
        kind: Set(model.kind),
        formula: Set(model.formula),
        is_manual: Set(model.is_manual),
        recurrence_source_id: Set(model.recurrence_source_id),
    }))
    .exec_without_returning(&txn)
    .await?;

    let overrides = standard_overrides();
    period_override::Entity::insert_many(overrides.iter().map(|seed| period_override::ActiveModel {
        account_id: Set(seed.account_id),
        month: Set(seed.month as i32),
        year: Set(seed.year),
        value: Set(seed.value),
        note: Set(Some(RECONCILED_NOTE.to_string())),
        ..Default::default()
    }))
    .exec_without_returning(&txn)
    .await?;
    txn.commit().await?;

    info!(
        "Seeded {} accounts and {} overrides",
        chart.len(),
        overrides.len()
    );
    Ok(chart.len())
}

/// A data-modelling problem in the chart of accounts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartIssue {
    #[error("account id {0} is not positive")]
    NonPositiveId(i32),
    #[error("account id {0} is defined more than once")]
    DuplicateId(i32),
    #[error("account {0} has is_manual inconsistent with its formula")]
    ManualFlagMismatch(i32),
    #[error("account {account_id} has an unparseable formula: {error}")]
    UnparseableFormula { account_id: i32, error: FormulaError },
    #[error("account {account_id} references unknown account {reference}")]
    UnknownReference { account_id: i32, reference: i32 },
    #[error("account {account_id} references derived account {reference}, which is not computed before it")]
    ForwardReference { account_id: i32, reference: i32 },
    #[error("account {0} uses a recurrence formula without a recurrence source")]
    MissingRecurrenceSource(i32),
    #[error("account {0} has a recurrence source but no recurrence formula")]
    UnexpectedRecurrenceSource(i32),
    #[error("account {account_id} uses unknown account {source_id} as recurrence source")]
    UnknownRecurrenceSource { account_id: i32, source_id: i32 },
    #[error("account {account_id} uses derived account {source_id} as recurrence source, which is not computed before it")]
    ForwardRecurrenceSource { account_id: i32, source_id: i32 },
}

/// Checks that ascending id order is a valid evaluation order and that
/// every formula and recurrence source resolves.
pub fn validate_chart(accounts: &[account::Model]) -> Vec<ChartIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    for account in accounts {
        if account.id <= 0 {
            issues.push(ChartIssue::NonPositiveId(account.id));
        }
        if !seen.insert(account.id) {
            issues.push(ChartIssue::DuplicateId(account.id));
        }
    }

    let derived: HashMap<i32, bool> = accounts
        .iter()
        .map(|account| (account.id, account.is_derived()))
        .collect();
    let is_later_derived = |reference: i32, account_id: i32| {
        derived.get(&reference).copied().unwrap_or(false) && reference >= account_id
    };

    for account in accounts {
        if account.is_manual != account.formula.is_none() {
            issues.push(ChartIssue::ManualFlagMismatch(account.id));
        }

        let formula = match account.formula.as_deref().map(Formula::parse) {
            None => {
                if account.recurrence_source_id.is_some() {
                    issues.push(ChartIssue::UnexpectedRecurrenceSource(account.id));
                }
                continue;
            }
            Some(Err(error)) => {
                issues.push(ChartIssue::UnparseableFormula {
                    account_id: account.id,
                    error,
                });
                continue;
            }
            Some(Ok(formula)) => formula,
        };

        for reference in formula.account_refs() {
            if !derived.contains_key(&reference) {
                issues.push(ChartIssue::UnknownReference {
                    account_id: account.id,
                    reference,
                });
            } else if is_later_derived(reference, account.id) {
                issues.push(ChartIssue::ForwardReference {
                    account_id: account.id,
                    reference,
                });
            }
        }

        match (formula.is_recurrence(), account.recurrence_source_id) {
            (true, None) => issues.push(ChartIssue::MissingRecurrenceSource(account.id)),
            (false, Some(_)) => issues.push(ChartIssue::UnexpectedRecurrenceSource(account.id)),
            (true, Some(source_id)) if !derived.contains_key(&source_id) => {
                issues.push(ChartIssue::UnknownRecurrenceSource {
                    account_id: account.id,
                    source_id,
                })
            }
            (true, Some(source_id)) if is_later_derived(source_id, account.id) => {
                issues.push(ChartIssue::ForwardRecurrenceSource {
                    account_id: account.id,
                    source_id,
                })
            }
            _ => {}
        }
    }

    debug!("Validated {} accounts, {} issue(s)", accounts.len(), issues.len());
    issues
}

/// Optional filters for [`load_accounts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountFilter {
    pub kind: Option<AccountKind>,
    pub manual: Option<bool>,
}

/// Accounts matching `filter`, ascending by id.
pub async fn load_accounts<C>(conn: &C, filter: AccountFilter) -> Result<Vec<account::Model>>
where
    C: ConnectionTrait,
{
    let mut query = account::Entity::find();
    if let Some(kind) = filter.kind {
        query = query.filter(account::Column::Kind.eq(kind));
    }
    if let Some(manual) = filter.manual {
        query = query.filter(account::Column::IsManual.eq(manual));
    }
    Ok(query.order_by_asc(account::Column::Id).all(conn).await?)
}
