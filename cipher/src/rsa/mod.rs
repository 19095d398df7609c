//! RSA
//!
//! - 选择两个质数$p$和$q$($p\neq q$), 则模数$n=p*q$. 模数的字节长度$k$满足: $2^{(k-1)*8}\le n \lt 2^{k*8}$;
//! - 公钥指数$e$与$\lambda(n) = lcm(p-1, q-1)$互质;
//! - 私钥指数$d$满足: $d*e \equiv 1 \mod \lambda(n)$;
//!
//! 加密: $y = x ^ e \mod n$;
//!
//! 解密: $y = x^d \mod n$;
//!
//! 原理: 欧拉定理$a^{\phi(n)} \equiv 1 \mod n$
//! - $x ^ {k(p-1)(q-1)+1} \equiv x \mod n$
//!
//! 素数$p$, $q$由[`crate::ifc`]按FIPS 186-4生成.

mod key;
pub use key::{PrivateKey, PublicKey};

mod mgf;
pub use mgf::{mgf1, mgf1_xor};

mod oaep;
pub use oaep::{OAEPDecrypt, OAEPEncrypt};
