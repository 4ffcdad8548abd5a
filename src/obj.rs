use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard},
};

// TbObj allows testbench components (masters, scoreboards, injectors) to be
// shared mutably between tasks. The simulation is single threaded, so Rc and
// RefCell are sufficient even though tasks formally require Send + Sync.
pub struct TbObj<T>(Rc<RefCell<T>>);

impl<T> TbObj<T> {
    pub fn new(data: T) -> TbObj<T> {
        TbObj(Rc::new(RefCell::new(data)))
    }
    pub fn get(&self) -> Ref<'_, T> {
        (*self.0).borrow()
    }
    pub fn get_mut(&self) -> RefMut<'_, T> {
        (*self.0).borrow_mut()
    }
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get())
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get_mut())
    }
}

impl<T> Clone for TbObj<T> {
    fn clone(&self) -> Self {
        TbObj(self.0.clone())
    }
}

// Rc is neither Send nor Sync, but the executor never leaves its thread.
unsafe impl<T> Send for TbObj<T> {}
unsafe impl<T> Sync for TbObj<T> {}

// Lock-backed variant for the few statics shared with session bookkeeping.
pub struct TbObjSafe<T>(Arc<Mutex<T>>);

impl<T> TbObjSafe<T> {
    pub fn new(data: T) -> TbObjSafe<T> {
        TbObjSafe(Arc::new(Mutex::new(data)))
    }
    pub fn get_mut(&self) -> MutexGuard<'_, T> {
        (*self.0).try_lock().unwrap()
    }
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.get_mut())
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.get_mut())
    }
}

impl<T> Clone for TbObjSafe<T> {
    fn clone(&self) -> Self {
        TbObjSafe(self.0.clone())
    }
}
