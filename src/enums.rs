//! Closed value sets for Linux container primitives.
//!
//! Each concept has exactly one enum. Variants map to the literal used in
//! descriptor files through `id()`/`from_id()`, and `ALL` lists them in
//! kernel order. Tables are generated from:
//! `linux/capability.h`, `asm-generic/resource.h`, `seccomp.h`.

use std::fmt;

/// A fixed set of literals a descriptor field must be drawn from.
pub trait ClosedSet: Sized {
    /// Human-readable name of the set, used in diagnostics.
    const LABEL: &'static str;

    fn lookup(id: &str) -> Option<Self>;

    fn choices() -> String;
}

macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($variant:ident => $id:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member, in kernel order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn id(self) -> &'static str {
                match self {
                    $($name::$variant => $id),+
                }
            }

            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $($id => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// The member literals joined with `/`, for messages.
            pub fn choices() -> String {
                Self::ALL.iter().map(|v| v.id()).collect::<Vec<_>>().join("/")
            }
        }

        impl ClosedSet for $name {
            const LABEL: &'static str = $label;

            fn lookup(id: &str) -> Option<Self> {
                Self::from_id(id)
            }

            fn choices() -> String {
                $name::choices()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }
    };
}

closed_set! {
    /// Linux capabilities (`man 7 capabilities`).
    Capability, "capability" {
        Chown => "CAP_CHOWN",
        DacOverride => "CAP_DAC_OVERRIDE",
        DacReadSearch => "CAP_DAC_READ_SEARCH",
        Fowner => "CAP_FOWNER",
        Fsetid => "CAP_FSETID",
        Kill => "CAP_KILL",
        Setgid => "CAP_SETGID",
        Setuid => "CAP_SETUID",
        Setpcap => "CAP_SETPCAP",
        LinuxImmutable => "CAP_LINUX_IMMUTABLE",
        NetBindService => "CAP_NET_BIND_SERVICE",
        NetBroadcast => "CAP_NET_BROADCAST",
        NetAdmin => "CAP_NET_ADMIN",
        NetRaw => "CAP_NET_RAW",
        IpcLock => "CAP_IPC_LOCK",
        IpcOwner => "CAP_IPC_OWNER",
        SysModule => "CAP_SYS_MODULE",
        SysRawio => "CAP_SYS_RAWIO",
        SysChroot => "CAP_SYS_CHROOT",
        SysPtrace => "CAP_SYS_PTRACE",
        SysPacct => "CAP_SYS_PACCT",
        SysAdmin => "CAP_SYS_ADMIN",
        SysBoot => "CAP_SYS_BOOT",
        SysNice => "CAP_SYS_NICE",
        SysResource => "CAP_SYS_RESOURCE",
        SysTime => "CAP_SYS_TIME",
        SysTtyConfig => "CAP_SYS_TTY_CONFIG",
        Mknod => "CAP_MKNOD",
        Lease => "CAP_LEASE",
        AuditWrite => "CAP_AUDIT_WRITE",
        AuditControl => "CAP_AUDIT_CONTROL",
        Setfcap => "CAP_SETFCAP",
        MacOverride => "CAP_MAC_OVERRIDE",
        MacAdmin => "CAP_MAC_ADMIN",
        Syslog => "CAP_SYSLOG",
        WakeAlarm => "CAP_WAKE_ALARM",
        BlockSuspend => "CAP_BLOCK_SUSPEND",
    }
}

closed_set! {
    /// POSIX resource limits.
    RlimitType, "rlimit" {
        Cpu => "RLIMIT_CPU",
        Fsize => "RLIMIT_FSIZE",
        Data => "RLIMIT_DATA",
        Stack => "RLIMIT_STACK",
        Core => "RLIMIT_CORE",
        Rss => "RLIMIT_RSS",
        Nproc => "RLIMIT_NPROC",
        Nofile => "RLIMIT_NOFILE",
        Memlock => "RLIMIT_MEMLOCK",
        As => "RLIMIT_AS",
        Locks => "RLIMIT_LOCKS",
        Sigpending => "RLIMIT_SIGPENDING",
        Msgqueue => "RLIMIT_MSGQUEUE",
        Nice => "RLIMIT_NICE",
        Rtprio => "RLIMIT_RTPRIO",
        Rttime => "RLIMIT_RTTIME",
    }
}

closed_set! {
    /// Action taken when a seccomp rule matches.
    SeccompAction, "seccomp action" {
        Kill => "SCMP_ACT_KILL",
        Trap => "SCMP_ACT_TRAP",
        Errno => "SCMP_ACT_ERRNO",
        Trace => "SCMP_ACT_TRACE",
        Allow => "SCMP_ACT_ALLOW",
    }
}

closed_set! {
    /// Additional architectures a seccomp filter may admit.
    SeccompArch, "seccomp architecture" {
        X86 => "SCMP_ARCH_X86",
        Amd64 => "SCMP_ARCH_X86_64",
        X32 => "SCMP_ARCH_X32",
        Arm => "SCMP_ARCH_ARM",
        Aarch64 => "SCMP_ARCH_AARCH64",
        Mips => "SCMP_ARCH_MIPS",
        Mips64 => "SCMP_ARCH_MIPS64",
        Mips64N32 => "SCMP_ARCH_MIPS64N32",
        Mipsel => "SCMP_ARCH_MIPSEL",
        Mipsel64 => "SCMP_ARCH_MIPSEL64",
        Mipsel64N32 => "SCMP_ARCH_MIPSEL64N32",
    }
}

closed_set! {
    /// Comparison applied to a syscall argument.
    SeccompOperator, "seccomp operator" {
        NotEqual => "SCMP_CMP_NE",
        LessEqual => "SCMP_CMP_LE",
        EqualTo => "SCMP_CMP_EQ",
        GreaterEqual => "SCMP_CMP_GE",
        GreaterThan => "SCMP_CMP_GT",
        MaskedEqual => "SCMP_CMP_MASKED_EQ",
    }
}

closed_set! {
    NamespaceType, "namespace" {
        Pid => "pid",
        Network => "network",
        Mount => "mount",
        Ipc => "ipc",
        Uts => "uts",
        User => "user",
    }
}

closed_set! {
    /// Device node kind, as the single character used by `mknod`.
    DeviceType, "device type" {
        Block => "b",
        Char => "c",
        Unbuffered => "u",
        Fifo => "p",
    }
}

closed_set! {
    RootfsPropagation, "rootfs propagation" {
        Slave => "slave",
        Private => "private",
        Shared => "shared",
    }
}

impl DeviceType {
    /// Block and character devices carry major/minor numbers; FIFOs do not.
    pub fn has_numbers(self) -> bool {
        !matches!(self, DeviceType::Fifo)
    }
}

/// Paths every Linux config must declare as mount points.
pub const REQUIRED_PATHS: &[&str] = &["/proc", "/sys"];

/// Device nodes every Linux runtime must declare.
pub const REQUIRED_DEVICES: &[&str] = &[
    "/dev/null",
    "/dev/zero",
    "/dev/full",
    "/dev/random",
    "/dev/urandom",
    "/dev/tty",
    "/dev/console",
];

pub fn is_valid_capability(s: &str) -> bool {
    Capability::from_id(s).is_some()
}

pub fn is_valid_rlimit(s: &str) -> bool {
    RlimitType::from_id(s).is_some()
}

pub fn is_valid_seccomp_action(s: &str) -> bool {
    SeccompAction::from_id(s).is_some()
}

pub fn is_valid_seccomp_arch(s: &str) -> bool {
    SeccompArch::from_id(s).is_some()
}

pub fn is_valid_seccomp_operator(s: &str) -> bool {
    SeccompOperator::from_id(s).is_some()
}

pub fn is_valid_namespace(s: &str) -> bool {
    NamespaceType::from_id(s).is_some()
}
