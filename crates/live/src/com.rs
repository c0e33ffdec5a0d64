//! `IDispatch` late binding against `PowerPoint.Application`.

pub use imp::{ComConnector, ComObject};

#[cfg(windows)]
mod imp {
    use crate::dispatch::{AutomationError, AutomationResult, Connector, Dispatch, Variant};
    use windows::core::{w, Interface, BSTR, GUID, IUnknown, PCWSTR, VARIANT};
    use windows::Win32::System::Com::{
        CLSIDFromProgID, CoCreateInstance, CoInitializeEx, IDispatch, CLSCTX_LOCAL_SERVER,
        COINIT_APARTMENTTHREADED, DISPATCH_FLAGS, DISPATCH_METHOD, DISPATCH_PROPERTYGET,
        DISPATCH_PROPERTYPUT, DISPPARAMS, EXCEPINFO,
    };
    use windows::Win32::System::Ole::{GetActiveObject, DISPID_PROPERTYPUT};
    use windows::Win32::System::Variant::{
        VT_BOOL, VT_BSTR, VT_DISPATCH, VT_EMPTY, VT_I1, VT_I2, VT_I4, VT_I8, VT_INT, VT_NULL,
        VT_R4, VT_R8, VT_UI1, VT_UI2, VT_UI4, VT_UINT,
    };

    const LOCALE_USER_DEFAULT: u32 = 0x0400;

    /// A live automation object.
    #[derive(Debug, Clone)]
    pub struct ComObject(IDispatch);

    fn com_error(member: &str, err: windows::core::Error) -> AutomationError {
        AutomationError::call(member, err.message())
    }

    impl ComObject {
        fn dispid(&self, name: &str) -> AutomationResult<i32> {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
            let names = [PCWSTR(wide.as_ptr())];
            let mut dispid = 0;
            unsafe {
                self.0
                    .GetIDsOfNames(&GUID::zeroed(), names.as_ptr(), 1, LOCALE_USER_DEFAULT, &mut dispid)
                    .map_err(|e| com_error(name, e))?;
            }
            Ok(dispid)
        }

        fn invoke(
            &self,
            name: &str,
            flags: DISPATCH_FLAGS,
            args: &[Variant<ComObject>],
        ) -> AutomationResult<Variant<ComObject>> {
            let dispid = self.dispid(name)?;

            // Arguments are passed right to left.
            let mut raw: Vec<VARIANT> = args.iter().rev().map(to_variant).collect::<Result<_, _>>()?;
            let mut named = DISPID_PROPERTYPUT;
            let is_put = flags == DISPATCH_PROPERTYPUT;
            let params = DISPPARAMS {
                rgvarg: raw.as_mut_ptr(),
                rgdispidNamedArgs: if is_put { &mut named } else { std::ptr::null_mut() },
                cArgs: raw.len() as u32,
                cNamedArgs: u32::from(is_put),
            };

            let mut result = VARIANT::default();
            let mut excep = EXCEPINFO::default();
            let outcome = unsafe {
                self.0.Invoke(
                    dispid,
                    &GUID::zeroed(),
                    LOCALE_USER_DEFAULT,
                    flags,
                    &params,
                    Some(&mut result),
                    Some(&mut excep),
                    None,
                )
            };
            if let Err(err) = outcome {
                let description = excep.bstrDescription.to_string();
                let message = if description.is_empty() {
                    err.message().to_string()
                } else {
                    description
                };
                return Err(AutomationError::call(name, message));
            }
            from_variant(name, &result)
        }
    }

    fn to_variant(value: &Variant<ComObject>) -> AutomationResult<VARIANT> {
        Ok(match value {
            Variant::Empty => VARIANT::default(),
            Variant::Bool(b) => VARIANT::from(*b),
            Variant::Int(i) => match i32::try_from(*i) {
                Ok(small) => VARIANT::from(small),
                Err(_) => VARIANT::from(*i),
            },
            Variant::Float(f) => VARIANT::from(*f),
            Variant::Text(s) => VARIANT::from(BSTR::from(s.as_str())),
            Variant::Object(o) => {
                let unknown: IUnknown = o
                    .0
                    .cast()
                    .map_err(|e| com_error("QueryInterface", e))?;
                VARIANT::from(unknown)
            }
        })
    }

    fn from_variant(member: &str, value: &VARIANT) -> AutomationResult<Variant<ComObject>> {
        let vt = value.vt();
        let converted = if vt == VT_EMPTY || vt == VT_NULL {
            Variant::Empty
        } else if vt == VT_BOOL {
            Variant::Bool(bool::try_from(value).map_err(|e| com_error(member, e))?)
        } else if [VT_I1, VT_I2, VT_I4, VT_I8, VT_INT, VT_UI1, VT_UI2, VT_UI4, VT_UINT].contains(&vt) {
            Variant::Int(i64::try_from(value).map_err(|e| com_error(member, e))?)
        } else if vt == VT_R4 || vt == VT_R8 {
            Variant::Float(f64::try_from(value).map_err(|e| com_error(member, e))?)
        } else if vt == VT_BSTR {
            Variant::Text(BSTR::try_from(value).map_err(|e| com_error(member, e))?.to_string())
        } else if vt == VT_DISPATCH {
            let unknown = IUnknown::try_from(value).map_err(|e| com_error(member, e))?;
            let dispatch: IDispatch = unknown.cast().map_err(|e| com_error(member, e))?;
            Variant::Object(ComObject(dispatch))
        } else {
            return Err(AutomationError::call(
                member,
                format!("unsupported variant type {}", vt.0),
            ));
        };
        Ok(converted)
    }

    impl Dispatch for ComObject {
        fn get(&self, name: &str) -> AutomationResult<Variant<Self>> {
            self.invoke(name, DISPATCH_PROPERTYGET | DISPATCH_METHOD, &[])
        }

        fn put(&self, name: &str, value: Variant<Self>) -> AutomationResult<()> {
            self.invoke(name, DISPATCH_PROPERTYPUT, &[value]).map(|_| ())
        }

        fn call(&self, name: &str, args: &[Variant<Self>]) -> AutomationResult<Variant<Self>> {
            self.invoke(name, DISPATCH_METHOD | DISPATCH_PROPERTYGET, args)
        }

        fn is_same(&self, other: &Self) -> bool {
            match (self.0.cast::<IUnknown>(), other.0.cast::<IUnknown>()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
    }

    /// Connects to PowerPoint through the COM class registry.
    #[derive(Debug, Default)]
    pub struct ComConnector;

    impl ComConnector {
        fn class_id(&self) -> AutomationResult<GUID> {
            unsafe {
                // S_FALSE (already initialized on this thread) is fine.
                let _ = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
                CLSIDFromProgID(w!("PowerPoint.Application"))
                    .map_err(|e| com_error("CLSIDFromProgID", e))
            }
        }
    }

    impl Connector for ComConnector {
        type Object = ComObject;

        fn is_available(&self) -> bool {
            self.class_id().is_ok()
        }

        fn attach(&self) -> AutomationResult<ComObject> {
            let clsid = self.class_id()?;
            let mut unknown: Option<IUnknown> = None;
            unsafe {
                GetActiveObject(&clsid, None, &mut unknown)
                    .map_err(|e| com_error("GetActiveObject", e))?;
            }
            let unknown = unknown.ok_or_else(|| {
                AutomationError::call("GetActiveObject", "no running instance")
            })?;
            let dispatch: IDispatch = unknown
                .cast()
                .map_err(|e| com_error("QueryInterface", e))?;
            Ok(ComObject(dispatch))
        }

        fn launch(&self) -> AutomationResult<ComObject> {
            let clsid = self.class_id()?;
            let dispatch: IDispatch = unsafe {
                CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER)
                    .map_err(|e| com_error("CoCreateInstance", e))?
            };
            Ok(ComObject(dispatch))
        }
    }
}

#[cfg(not(windows))]
mod imp {
    use crate::dispatch::{AutomationError, AutomationResult, Connector, Dispatch, Variant};

    /// No automation objects exist off Windows.
    #[derive(Debug, Clone)]
    pub enum ComObject {}

    impl Dispatch for ComObject {
        fn get(&self, _name: &str) -> AutomationResult<Variant<Self>> {
            match *self {}
        }

        fn put(&self, _name: &str, _value: Variant<Self>) -> AutomationResult<()> {
            match *self {}
        }

        fn call(&self, _name: &str, _args: &[Variant<Self>]) -> AutomationResult<Variant<Self>> {
            match *self {}
        }

        fn is_same(&self, _other: &Self) -> bool {
            match *self {}
        }
    }

    /// Connector that never connects.
    #[derive(Debug, Default)]
    pub struct ComConnector;

    impl Connector for ComConnector {
        type Object = ComObject;

        fn is_available(&self) -> bool {
            false
        }

        fn attach(&self) -> AutomationResult<ComObject> {
            Err(AutomationError::NotAvailable)
        }

        fn launch(&self) -> AutomationResult<ComObject> {
            Err(AutomationError::NotAvailable)
        }
    }
}
