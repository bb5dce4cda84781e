//! The balance core.
//!
//! Pure, synchronous functions over in-memory rows: net balance
//! computation, the greedy settlement plan, and split generation. The ops
//! layer loads a consistent snapshot per group inside one transaction and
//! delegates here; nothing in this module touches the database.

use std::collections::{HashMap, HashSet};

use crate::{
    EngineError, Money, ResultEngine, expenses::Expense, group_members::GroupMember,
    settlements::Settlement, splits::Split,
};

/// Balances within one minor unit of zero count as settled. Suggested
/// transfers below this threshold are not worth anyone's time.
pub const SETTLEMENT_EPSILON: Money = Money::new(1);

/// One member's net position in a group.
///
/// `balance = paid - owes + settled`. Positive means the group owes this
/// member, negative means this member owes the group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberBalance {
    pub user_id: String,
    pub display_name: String,
    /// Sum of group expenses this member paid for.
    pub paid: Money,
    /// Sum of this member's split amounts.
    pub owes: Money,
    /// Net adjustment from recorded settlements (outgoing minus incoming).
    pub settled: Money,
    pub balance: Money,
}

/// A suggested repayment from one member to another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: Money,
}

/// The output of [`compute_settlements`]: the transfers that settle the
/// sheet, plus whatever magnitude could not be matched. `residual` is zero
/// for a consistent sheet and only grows when upstream rows do not sum up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettlementPlan {
    pub transfers: Vec<Transfer>,
    pub residual: Money,
}

/// Computes one net balance row per member from the group's expenses,
/// splits and recorded settlements.
///
/// - `paid` accrues to the expense payer and `owes` to each split user, in
///   one indexed pass over expenses and one over splits.
/// - Expenses paid by someone outside `members`, splits pointing at an
///   expense outside `expenses`, and splits for non-members are skipped
///   silently: totals only ever accrue to listed members.
/// - Every settlement moves `settled` (payer up, receiver down). Callers
///   that treat recorded settlements as informational pass an empty slice.
/// - Output is sorted by balance, largest creditor first. The sort is
///   stable, so ties keep member-list order.
pub fn compute_balances(
    members: &[GroupMember],
    expenses: &[Expense],
    splits: &[Split],
    settlements: &[Settlement],
) -> Vec<MemberBalance> {
    let mut rows: Vec<MemberBalance> = members
        .iter()
        .map(|member| MemberBalance {
            user_id: member.user_id.clone(),
            display_name: member.display_name.clone(),
            paid: Money::ZERO,
            owes: Money::ZERO,
            settled: Money::ZERO,
            balance: Money::ZERO,
        })
        .collect();

    let positions: HashMap<&str, usize> = members
        .iter()
        .enumerate()
        .map(|(position, member)| (member.user_id.as_str(), position))
        .collect();
    let known_expenses: HashSet<_> = expenses.iter().map(|expense| expense.id).collect();

    for expense in expenses {
        if let Some(&position) = positions.get(expense.paid_by.as_str()) {
            rows[position].paid += expense.amount;
        }
    }

    for split in splits {
        if !known_expenses.contains(&split.expense_id) {
            continue;
        }
        if let Some(&position) = positions.get(split.user_id.as_str()) {
            rows[position].owes += split.amount;
        }
    }

    for settlement in settlements {
        if let Some(&position) = positions.get(settlement.from_user_id.as_str()) {
            rows[position].settled += settlement.amount;
        }
        if let Some(&position) = positions.get(settlement.to_user_id.as_str()) {
            rows[position].settled -= settlement.amount;
        }
    }

    for row in &mut rows {
        row.balance = row.paid - row.owes + row.settled;
    }

    rows.sort_by(|a, b| b.balance.cmp(&a.balance));
    rows
}

/// Reduces a balance sheet to a short list of member-to-member transfers.
///
/// Creditors (`balance > ε`) and debtors (`balance < -ε`) are taken in
/// sheet order and matched with two cursors: each step pays
/// `min(credit, debt)` from the current debtor to the current creditor and
/// advances whichever side is exhausted. Transfers at or below the
/// tolerance are dropped rather than emitted.
///
/// For `C` creditors and `D` debtors the plan holds at most `C + D - 1`
/// transfers and never a self-transfer. Runs on the same sheet are
/// bit-identical.
pub fn compute_settlements(balances: &[MemberBalance]) -> SettlementPlan {
    let mut creditors: Vec<(&str, Money)> = balances
        .iter()
        .filter(|row| row.balance > SETTLEMENT_EPSILON)
        .map(|row| (row.user_id.as_str(), row.balance))
        .collect();
    let mut debtors: Vec<(&str, Money)> = balances
        .iter()
        .filter(|row| row.balance < -SETTLEMENT_EPSILON)
        .map(|row| (row.user_id.as_str(), -row.balance))
        .collect();

    let mut transfers = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < creditors.len() && j < debtors.len() {
        let amount = creditors[i].1.min(debtors[j].1);
        if amount > SETTLEMENT_EPSILON {
            transfers.push(Transfer {
                from: debtors[j].0.to_string(),
                to: creditors[i].0.to_string(),
                amount,
            });
        }
        creditors[i].1 -= amount;
        debtors[j].1 -= amount;
        if creditors[i].1 < SETTLEMENT_EPSILON {
            i += 1;
        }
        if debtors[j].1 < SETTLEMENT_EPSILON {
            j += 1;
        }
    }

    let residual = creditors[i..]
        .iter()
        .chain(debtors[j..].iter())
        .fold(Money::ZERO, |acc, (_, remaining)| acc + *remaining);

    SettlementPlan {
        transfers,
        residual,
    }
}

/// Divides `amount` evenly across `participants` shares.
///
/// Integer division leaves a remainder of up to `participants - 1` minor
/// units; the first share absorbs it. Callers put the payer first, so the
/// odd paise land on the person who fronted the money.
pub fn equal_shares(amount: Money, participants: usize) -> ResultEngine<Vec<Money>> {
    if participants == 0 {
        return Err(EngineError::InvalidSplit(
            "participants must be > 0".to_string(),
        ));
    }
    let total = amount.minor();
    let count = participants as i64;
    let base = total / count;
    let mut shares = vec![Money::new(base); participants];
    shares[0] += Money::new(total - base * count);
    Ok(shares)
}

/// Divides `amount` by percentage weights given in basis points.
///
/// The weights must be non-negative and sum to exactly 10 000 (100%). Each
/// share is floor(amount * bp / 10000); the first share absorbs the
/// rounding remainder so the shares sum to `amount` exactly.
pub fn percent_shares(amount: Money, percents_bp: &[i32]) -> ResultEngine<Vec<Money>> {
    if percents_bp.is_empty() {
        return Err(EngineError::InvalidSplit(
            "participants must be > 0".to_string(),
        ));
    }
    if percents_bp.iter().any(|bp| *bp < 0) {
        return Err(EngineError::InvalidSplit(
            "percentages must be >= 0".to_string(),
        ));
    }
    let total_bp: i64 = percents_bp.iter().map(|bp| i64::from(*bp)).sum();
    if total_bp != 10_000 {
        return Err(EngineError::InvalidSplit(format!(
            "percentages must sum to 100%, got {total_bp} bp"
        )));
    }

    let total = amount.minor();
    let mut shares = Vec::with_capacity(percents_bp.len());
    let mut assigned: i64 = 0;
    for bp in percents_bp {
        let share = total
            .checked_mul(i64::from(*bp))
            .map(|scaled| scaled / 10_000)
            .ok_or_else(|| EngineError::InvalidAmount("amount out of range".to_string()))?;
        assigned += share;
        shares.push(Money::new(share));
    }
    shares[0] += Money::new(total - assigned);
    Ok(shares)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::ExpenseCategory;

    fn member(user_id: &str) -> GroupMember {
        GroupMember::new(user_id, user_id, "member", Utc::now())
    }

    fn expense(paid_by: &str, amount: i64) -> Expense {
        Expense::new(
            "g1".to_string(),
            "Shared".to_string(),
            ExpenseCategory::Other,
            Money::new(amount),
            None,
            None,
            paid_by.to_string(),
            Utc::now(),
            paid_by.to_string(),
        )
        .unwrap()
    }

    fn split(expense: &Expense, user_id: &str, amount: i64) -> Split {
        Split::new(expense.id, user_id, Money::new(amount)).unwrap()
    }

    fn balance_of<'a>(rows: &'a [MemberBalance], user_id: &str) -> &'a MemberBalance {
        rows.iter().find(|row| row.user_id == user_id).unwrap()
    }

    /// Members a/b/c, a pays 300.00 split three ways.
    fn three_way_scenario() -> (Vec<GroupMember>, Vec<Expense>, Vec<Split>) {
        let members = vec![member("a"), member("b"), member("c")];
        let paid = expense("a", 300_00);
        let splits = vec![
            split(&paid, "a", 100_00),
            split(&paid, "b", 100_00),
            split(&paid, "c", 100_00),
        ];
        (members, vec![paid], splits)
    }

    #[test]
    fn balances_sum_to_zero() {
        let members = vec![member("a"), member("b"), member("c")];
        let dinner = expense("a", 90_01);
        let cab = expense("b", 45_50);
        let splits = vec![
            split(&dinner, "a", 30_01),
            split(&dinner, "b", 30_00),
            split(&dinner, "c", 30_00),
            split(&cab, "b", 25_50),
            split(&cab, "c", 20_00),
        ];
        let rows = compute_balances(&members, &[dinner, cab], &splits, &[]);

        let total = rows.iter().fold(Money::ZERO, |acc, row| acc + row.balance);
        assert_eq!(total, Money::ZERO);
    }

    #[test]
    fn equal_three_way_split() {
        let (members, expenses, splits) = three_way_scenario();
        let rows = compute_balances(&members, &expenses, &splits, &[]);

        assert_eq!(balance_of(&rows, "a").balance, Money::new(200_00));
        assert_eq!(balance_of(&rows, "b").balance, Money::new(-100_00));
        assert_eq!(balance_of(&rows, "c").balance, Money::new(-100_00));

        let plan = compute_settlements(&rows);
        assert_eq!(plan.transfers.len(), 2);
        assert!(plan.transfers.iter().all(|transfer| transfer.to == "a"));
        assert!(
            plan.transfers
                .iter()
                .all(|transfer| transfer.amount == Money::new(100_00))
        );
        assert_eq!(plan.residual, Money::ZERO);
    }

    #[test]
    fn transfers_settle_every_balance() {
        let members = vec![member("a"), member("b"), member("c"), member("d")];
        let rent = expense("a", 1200_00);
        let groceries = expense("b", 87_35);
        let splits = vec![
            split(&rent, "a", 300_00),
            split(&rent, "b", 300_00),
            split(&rent, "c", 300_00),
            split(&rent, "d", 300_00),
            split(&groceries, "b", 21_84),
            split(&groceries, "c", 21_84),
            split(&groceries, "d", 21_84),
            split(&groceries, "a", 21_83),
        ];
        let rows = compute_balances(&members, &[rent, groceries], &splits, &[]);
        let plan = compute_settlements(&rows);

        let mut remaining: HashMap<&str, Money> = rows
            .iter()
            .map(|row| (row.user_id.as_str(), row.balance))
            .collect();
        for transfer in &plan.transfers {
            *remaining.get_mut(transfer.from.as_str()).unwrap() += transfer.amount;
            *remaining.get_mut(transfer.to.as_str()).unwrap() -= transfer.amount;
        }
        for (_, balance) in remaining {
            assert!(balance <= SETTLEMENT_EPSILON && balance >= -SETTLEMENT_EPSILON);
        }
        assert_eq!(plan.residual, Money::ZERO);
    }

    #[test]
    fn transfer_count_is_bounded() {
        let members = vec![
            member("a"),
            member("b"),
            member("c"),
            member("d"),
            member("e"),
        ];
        let one = expense("a", 500_00);
        let two = expense("b", 300_00);
        let splits = vec![
            split(&one, "c", 250_00),
            split(&one, "d", 150_00),
            split(&one, "e", 100_00),
            split(&two, "d", 200_00),
            split(&two, "e", 100_00),
        ];
        let rows = compute_balances(&members, &[one, two], &splits, &[]);
        let plan = compute_settlements(&rows);

        let creditors = rows
            .iter()
            .filter(|row| row.balance > SETTLEMENT_EPSILON)
            .count();
        let debtors = rows
            .iter()
            .filter(|row| row.balance < -SETTLEMENT_EPSILON)
            .count();
        assert!(plan.transfers.len() <= creditors + debtors - 1);
        assert!(
            plan.transfers
                .iter()
                .all(|transfer| transfer.from != transfer.to)
        );
    }

    #[test]
    fn plan_is_deterministic() {
        let (members, expenses, splits) = three_way_scenario();
        let first = compute_balances(&members, &expenses, &splits, &[]);
        let second = compute_balances(&members, &expenses, &splits, &[]);
        assert_eq!(first, second);
        assert_eq!(compute_settlements(&first), compute_settlements(&second));
    }

    #[test]
    fn no_expenses_means_everyone_settled() {
        let members = vec![member("a"), member("b"), member("c")];
        let rows = compute_balances(&members, &[], &[], &[]);

        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|row| row.balance.is_zero()));
        let plan = compute_settlements(&rows);
        assert!(plan.transfers.is_empty());
        assert_eq!(plan.residual, Money::ZERO);
    }

    #[test]
    fn settled_group_needs_no_transfers() {
        let members = vec![member("a"), member("b")];
        let first = expense("a", 100_00);
        let second = expense("b", 100_00);
        let splits = vec![
            split(&first, "a", 50_00),
            split(&first, "b", 50_00),
            split(&second, "a", 50_00),
            split(&second, "b", 50_00),
        ];
        let rows = compute_balances(&members, &[first, second], &splits, &[]);

        assert!(rows.iter().all(|row| row.balance.is_zero()));
        assert!(compute_settlements(&rows).transfers.is_empty());
    }

    #[test]
    fn chain_skips_settled_member() {
        let members = vec![member("a"), member("b"), member("c")];
        let paid = expense("c", 100_00);
        let splits = vec![split(&paid, "a", 50_00), split(&paid, "c", 50_00)];
        let rows = compute_balances(&members, &[paid], &splits, &[]);
        let plan = compute_settlements(&rows);

        assert_eq!(plan.transfers.len(), 1);
        assert_eq!(plan.transfers[0].from, "a");
        assert_eq!(plan.transfers[0].to, "c");
        assert_eq!(plan.transfers[0].amount, Money::new(50_00));
    }

    #[test]
    fn rounding_residue_stays_within_tolerance() {
        let members = vec![member("a"), member("b"), member("c")];
        let paid = expense("a", 100_00);
        let shares = equal_shares(Money::new(100_00), 3).unwrap();
        let splits = vec![
            split(&paid, "a", shares[0].minor()),
            split(&paid, "b", shares[1].minor()),
            split(&paid, "c", shares[2].minor()),
        ];
        let rows = compute_balances(&members, &[paid], &splits, &[]);
        let plan = compute_settlements(&rows);

        let mut remaining: HashMap<&str, Money> = rows
            .iter()
            .map(|row| (row.user_id.as_str(), row.balance))
            .collect();
        for transfer in &plan.transfers {
            *remaining.get_mut(transfer.from.as_str()).unwrap() += transfer.amount;
            *remaining.get_mut(transfer.to.as_str()).unwrap() -= transfer.amount;
        }
        for (_, balance) in remaining {
            assert!(balance <= SETTLEMENT_EPSILON && balance >= -SETTLEMENT_EPSILON);
        }
        assert!(
            plan.transfers
                .iter()
                .all(|transfer| transfer.amount > SETTLEMENT_EPSILON)
        );
    }

    #[test]
    fn sub_tolerance_balances_are_left_alone() {
        let mut rows = compute_balances(&[member("a"), member("b")], &[], &[], &[]);
        rows[0].balance = Money::new(1);
        rows[1].balance = Money::new(-1);

        let plan = compute_settlements(&rows);
        assert!(plan.transfers.is_empty());
        assert_eq!(plan.residual, Money::ZERO);
    }

    #[test]
    fn foreign_payers_and_orphan_splits_are_ignored() {
        let members = vec![member("a"), member("b")];
        let known = expense("a", 60_00);
        let foreign = expense("ghost", 40_00);
        let orphan = expense("a", 10_00);
        let splits = vec![
            split(&known, "a", 30_00),
            split(&known, "b", 30_00),
            split(&known, "ghost", 0),
            split(&foreign, "a", 20_00),
            split(&foreign, "b", 20_00),
            split(&orphan, "b", 10_00),
        ];
        let rows = compute_balances(&members, &[known, foreign], &splits, &[]);

        assert_eq!(balance_of(&rows, "a").paid, Money::new(60_00));
        assert_eq!(balance_of(&rows, "a").owes, Money::new(50_00));
        assert_eq!(balance_of(&rows, "b").owes, Money::new(50_00));
    }

    #[test]
    fn settlements_move_the_settled_column() {
        let (members, expenses, splits) = three_way_scenario();
        let repayment = Settlement::new(
            "g1".to_string(),
            "b".to_string(),
            "a".to_string(),
            Money::new(100_00),
            Utc::now(),
            None,
        )
        .unwrap();
        let rows = compute_balances(&members, &expenses, &splits, &[repayment]);

        assert_eq!(balance_of(&rows, "b").settled, Money::new(100_00));
        assert_eq!(balance_of(&rows, "b").balance, Money::ZERO);
        assert_eq!(balance_of(&rows, "a").settled, Money::new(-100_00));
        assert_eq!(balance_of(&rows, "a").balance, Money::new(100_00));

        let plan = compute_settlements(&rows);
        assert_eq!(plan.transfers.len(), 1);
        assert_eq!(plan.transfers[0].from, "c");
    }

    #[test]
    fn ties_keep_member_order() {
        let (members, expenses, splits) = three_way_scenario();
        let rows = compute_balances(&members, &expenses, &splits, &[]);

        assert_eq!(rows[0].user_id, "a");
        assert_eq!(rows[1].user_id, "b");
        assert_eq!(rows[2].user_id, "c");
    }

    #[test]
    fn equal_shares_give_remainder_to_first() {
        let shares = equal_shares(Money::new(100_00), 3).unwrap();
        assert_eq!(
            shares,
            vec![Money::new(33_34), Money::new(33_33), Money::new(33_33)]
        );
        let total = shares.iter().fold(Money::ZERO, |acc, share| acc + *share);
        assert_eq!(total, Money::new(100_00));
    }

    #[test]
    #[should_panic(expected = "InvalidSplit(\"participants must be > 0\")")]
    fn equal_shares_reject_zero_participants() {
        equal_shares(Money::new(100_00), 0).unwrap();
    }

    #[test]
    fn percent_shares_follow_weights() {
        let shares = percent_shares(Money::new(90_00), &[5_000, 3_000, 2_000]).unwrap();
        assert_eq!(
            shares,
            vec![Money::new(45_00), Money::new(27_00), Money::new(18_00)]
        );
    }

    #[test]
    fn percent_shares_give_remainder_to_first() {
        let shares = percent_shares(Money::new(100_01), &[3_333, 3_333, 3_334]).unwrap();
        let total = shares.iter().fold(Money::ZERO, |acc, share| acc + *share);
        assert_eq!(total, Money::new(100_01));
        assert!(shares[0] >= shares[1]);
    }

    #[test]
    #[should_panic(expected = "percentages must sum to 100%")]
    fn percent_shares_reject_bad_total() {
        percent_shares(Money::new(100_00), &[5_000, 4_000]).unwrap();
    }
}
