//! Utilidades dependientes de Unix para mostrar permisos detallados.

#[cfg(unix)]
pub fn owner_name(metadata: &std::fs::Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    use users::get_user_by_uid;

    get_user_by_uid(metadata.uid()).map(|user| user.name().to_string_lossy().into_owned())
}

#[cfg(unix)]
pub fn group_name(metadata: &std::fs::Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    use users::get_group_by_gid;

    get_group_by_gid(metadata.gid()).map(|group| group.name().to_string_lossy().into_owned())
}

/// Notación `rwxr-x---` para los bits de usuario, grupo y otros.
#[cfg(unix)]
pub fn format_unix_permissions(mode: u32) -> String {
    const SYMBOLS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];

    [6_u32, 3, 0]
        .into_iter()
        .map(|shift| SYMBOLS[((mode >> shift) & 0o7) as usize])
        .collect()
}
