//! Single-assignment resolution cells
//!
//! A [`Value`] is created against a type, starts pending, and resolves at
//! most once. Constraints registered while pending are validated at
//! definition time; observers registered with [`Value::then`] are notified
//! exactly once, whichever side of the definition they arrive on.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::common::{IrError, IrResult};
use crate::types::{Datum, TypeId};

/// What a resolved cell holds.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Statically typed, runtime-opaque until execution.
    Dynamic,
    /// Concrete raw data.
    Datum(Datum),
}

impl From<Datum> for Payload {
    fn from(datum: Datum) -> Self {
        Self::Datum(datum)
    }
}

type Constraint = Box<dyn Fn(&Payload) -> IrResult<()>>;
type Waiter = Box<dyn FnOnce(&Payload)>;

enum State {
    Pending {
        constraints: Vec<Constraint>,
        waiters: Vec<Waiter>,
    },
    Defined(Payload),
}

struct Cell {
    ty: TypeId,
    state: RefCell<State>,
}

/// Handle to a single-assignment cell bound to exactly one type.
///
/// Clones share the cell; equality is cell identity. The cell is
/// single-writer until defined and effectively immutable afterwards.
#[derive(Clone)]
pub struct Value {
    cell: Rc<Cell>,
}

impl Value {
    /// A fresh, pending cell of the given type.
    pub fn new(ty: TypeId) -> Self {
        Self {
            cell: Rc::new(Cell {
                ty,
                state: RefCell::new(State::Pending {
                    constraints: Vec::new(),
                    waiters: Vec::new(),
                }),
            }),
        }
    }

    /// A cell born defined. Used for bindings whose payload is known at
    /// construction, like the dynamic marker.
    pub(crate) fn resolved(ty: TypeId, payload: Payload) -> Self {
        Self {
            cell: Rc::new(Cell {
                ty,
                state: RefCell::new(State::Defined(payload)),
            }),
        }
    }

    pub fn ty(&self) -> TypeId {
        self.cell.ty
    }

    pub fn is_defined(&self) -> bool {
        matches!(&*self.cell.state.borrow(), State::Defined(_))
    }

    /// The defined payload, if any.
    pub fn payload(&self) -> Option<Payload> {
        match &*self.cell.state.borrow() {
            State::Defined(payload) => Some(payload.clone()),
            State::Pending { .. } => None,
        }
    }

    /// Resolve the cell.
    ///
    /// Validate-then-commit: every registered constraint runs against the
    /// payload, in registration order, before the cell transitions. The first
    /// failure aborts the definition and leaves the cell pending, with its
    /// constraints and waiters intact, so nothing downstream ever observes a
    /// payload that failed validation. After the transition every waiter is
    /// invoked with the payload, in registration order, and the waiter list
    /// is released.
    pub fn define(&self, payload: Payload) -> IrResult<()> {
        let (mut pending, waiters) = {
            let mut state = self.cell.state.borrow_mut();
            match &mut *state {
                State::Defined(_) => {
                    return Err(IrError::state("value is already defined"));
                }
                State::Pending {
                    constraints,
                    waiters,
                } => (mem::take(constraints), mem::take(waiters)),
            }
        };

        // No borrow is held while user code runs, so constraints may touch
        // the cell. Constraints registered mid-validation get vetted too.
        let mut checked: Vec<Constraint> = Vec::new();
        while !pending.is_empty() {
            let mut failure = None;
            for constraint in &pending {
                if let Err(err) = constraint(&payload) {
                    failure = Some(err);
                    break;
                }
            }
            checked.append(&mut pending);
            if let Some(err) = failure {
                self.restore(checked, waiters);
                return Err(err);
            }
            pending = self.drain_constraints();
        }

        let late_waiters = {
            let mut state = self.cell.state.borrow_mut();
            if matches!(&*state, State::Defined(_)) {
                return Err(IrError::state("value was defined while its constraints ran"));
            }
            let late = match &mut *state {
                State::Pending { waiters, .. } => mem::take(waiters),
                State::Defined(_) => Vec::new(),
            };
            *state = State::Defined(payload.clone());
            late
        };
        for waiter in waiters.into_iter().chain(late_waiters) {
            waiter(&payload);
        }
        Ok(())
    }

    /// Put validated constraints and undelivered waiters back after an
    /// aborted definition, ahead of anything registered mid-validation.
    fn restore(&self, constraints: Vec<Constraint>, waiters: Vec<Waiter>) {
        let mut state = self.cell.state.borrow_mut();
        if let State::Pending {
            constraints: constraint_slot,
            waiters: waiter_slot,
        } = &mut *state
        {
            let late = mem::replace(constraint_slot, constraints);
            constraint_slot.extend(late);
            let late = mem::replace(waiter_slot, waiters);
            waiter_slot.extend(late);
        }
    }

    fn drain_constraints(&self) -> Vec<Constraint> {
        match &mut *self.cell.state.borrow_mut() {
            State::Pending { constraints, .. } => mem::take(constraints),
            State::Defined(_) => Vec::new(),
        }
    }

    /// Register a predicate the payload must satisfy at definition time.
    /// Fails once the cell is defined.
    pub fn constrain(
        &self,
        constraint: impl Fn(&Payload) -> IrResult<()> + 'static,
    ) -> IrResult<()> {
        match &mut *self.cell.state.borrow_mut() {
            State::Pending { constraints, .. } => {
                constraints.push(Box::new(constraint));
                Ok(())
            }
            State::Defined(payload) => Err(IrError::state(format!(
                "cannot constrain a value already defined to {payload:?}"
            ))),
        }
    }

    /// Observe the definition: synchronously now if the cell is defined,
    /// otherwise once at definition time. A minimal single-resolution
    /// future, with no cancellation and no failure channel.
    pub fn then(&self, waiter: impl FnOnce(&Payload) + 'static) {
        let payload = {
            let mut state = self.cell.state.borrow_mut();
            match &mut *state {
                State::Pending { waiters, .. } => {
                    waiters.push(Box::new(waiter));
                    return;
                }
                State::Defined(payload) => payload.clone(),
            }
        };
        waiter(&payload);
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("ty", &self.cell.ty)
            .field("payload", &self.payload())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeRegistry;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn number() -> TypeId {
        let mut types = TypeRegistry::new();
        types.primitive("Number", |datum| matches!(datum, Datum::Int(_)))
    }

    fn int(value: i64) -> Payload {
        Payload::Datum(Datum::Int(value))
    }

    #[test]
    fn test_define_at_most_once() {
        let value = Value::new(number());
        value.define(int(1)).unwrap();
        assert!(matches!(
            value.define(int(2)),
            Err(IrError::State { .. })
        ));
        assert_eq!(value.payload(), Some(int(1)));
    }

    #[test]
    fn test_constrain_after_define_fails() {
        let value = Value::new(number());
        value.define(int(1)).unwrap();
        assert!(matches!(
            value.constrain(|_| Ok(())),
            Err(IrError::State { .. })
        ));
    }

    #[test]
    fn test_constraints_run_in_order_and_first_failure_aborts() {
        let value = Value::new(number());
        let log = Rc::new(RefCell::new(Vec::new()));

        let seen = Rc::clone(&log);
        value
            .constrain(move |_| {
                seen.borrow_mut().push("first");
                Ok(())
            })
            .unwrap();
        let seen = Rc::clone(&log);
        value
            .constrain(move |_| {
                seen.borrow_mut().push("second");
                Err(IrError::constraint("second always fails"))
            })
            .unwrap();
        let seen = Rc::clone(&log);
        value
            .constrain(move |_| {
                seen.borrow_mut().push("third");
                Ok(())
            })
            .unwrap();

        assert!(matches!(
            value.define(int(1)),
            Err(IrError::Constraint { .. })
        ));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_failed_definition_leaves_cell_pending() {
        let value = Value::new(number());
        value
            .constrain(|payload| match payload {
                Payload::Datum(Datum::Int(n)) if n % 2 == 0 => Ok(()),
                _ => Err(IrError::constraint("payload must be even")),
            })
            .unwrap();

        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&observed);
        value.then(move |payload| seen.borrow_mut().push(payload.clone()));

        // The rejected payload is not observable afterwards: the cell stays
        // pending, waiters stay queued, and a valid payload still lands.
        assert!(value.define(int(3)).is_err());
        assert!(!value.is_defined());
        assert!(observed.borrow().is_empty());

        value.define(int(4)).unwrap();
        assert_eq!(*observed.borrow(), vec![int(4)]);
    }

    #[test]
    fn test_then_before_definition_delivers_once_at_define_time() {
        let value = Value::new(number());
        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&observed);
        value.then(move |payload| seen.borrow_mut().push(payload.clone()));

        assert!(observed.borrow().is_empty());
        value.define(int(7)).unwrap();
        assert_eq!(*observed.borrow(), vec![int(7)]);
    }

    #[test]
    fn test_then_after_definition_delivers_synchronously() {
        let value = Value::new(number());
        value.define(int(7)).unwrap();

        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&observed);
        value.then(move |payload| seen.borrow_mut().push(payload.clone()));
        assert_eq!(*observed.borrow(), vec![int(7)]);
    }

    #[test]
    fn test_waiters_run_in_registration_order() {
        let value = Value::new(number());
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&log);
            value.then(move |_| seen.borrow_mut().push(tag));
        }
        value.define(int(0)).unwrap();
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_even_number_scenario() {
        let even = |payload: &Payload| match payload {
            Payload::Datum(Datum::Int(n)) if n % 2 == 0 => Ok(()),
            _ => Err(IrError::constraint("payload must be even")),
        };

        let value = Value::new(number());
        value.constrain(even).unwrap();
        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&observed);
        value.then(move |payload| seen.borrow_mut().push(payload.clone()));
        value.define(int(4)).unwrap();
        assert_eq!(*observed.borrow(), vec![int(4)]);

        let odd = Value::new(number());
        odd.constrain(even).unwrap();
        assert!(matches!(
            odd.define(int(3)),
            Err(IrError::Constraint { .. })
        ));
    }

    #[test]
    fn test_handle_equality_is_cell_identity() {
        let ty = number();
        let value = Value::new(ty);
        let alias = value.clone();
        let other = Value::new(ty);
        assert_eq!(value, alias);
        assert_ne!(value, other);
    }
}
