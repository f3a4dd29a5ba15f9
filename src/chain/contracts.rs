//! Solidity interface definitions for the token and the Bank.
//!
//! - [`IERC20Permit`] - ERC-20 with the ERC-2612 `permit` extension
//! - [`IBank`] - Custodial ledger accepting permit-backed deposits

use alloy_sol_types::sol;

sol! {
    /// ERC-20 token with ERC-2612 permit support.
    ///
    /// The deposit workflow only reads from it. `approve`, `transfer`, `transferFrom` and
    /// `permit` are declared so the same binding can serve other callers; `permit` is consumed
    /// by the Bank from inside `depositWithPermit`, with this exact argument order.
    ///
    /// Reference: <https://eips.ethereum.org/EIPS/eip-2612>
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Permit {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function nonces(address owner) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function permit(
            address owner,
            address spender,
            uint256 value,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}

sol! {
    /// Custodial ledger contract.
    ///
    /// `depositWithPermit` calls `permit` on the token with `msg.sender` as owner and itself as
    /// spender, pulls the tokens and credits the ledger in one transaction.
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IBank {
        function supportedTokens(address token) external view returns (bool);
        function getBalance(address user, address token) external view returns (uint256);
        function depositWithPermit(
            address token,
            uint256 amount,
            uint256 deadline,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
    }
}
